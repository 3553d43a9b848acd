use crate::{Sink, SinkFuture};
use anyhow::Result;
use aws_config::BehaviorVersion;
use aws_sdk_firehose::error::DisplayErrorContext;
use aws_sdk_firehose::{primitives::Blob, types::Record, Client};
use logs_core::{LogEntry, LogsError};
use tracing::{debug, error, info};

/// Delivers one newline-terminated JSON document per entry to a Firehose
/// delivery stream. The stream partitions on the `call_type` field.
pub struct FirehoseSink {
    client: Client,
    delivery_stream_name: String,
}

impl FirehoseSink {
    pub async fn new(delivery_stream_name: String, region: &str) -> Result<Self> {
        info!(stream = %delivery_stream_name, region, "Initializing FirehoseSink");
        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_config::Region::new(region.to_string()))
            .load()
            .await;

        Ok(Self {
            client: Client::new(&aws_config),
            delivery_stream_name,
        })
    }

    pub fn delivery_stream_name(&self) -> &str {
        &self.delivery_stream_name
    }

    async fn put(&self, entry: &LogEntry) -> Result<()> {
        let payload = encode_record(entry)?;
        let record = Record::builder()
            .data(Blob::new(payload))
            .build()
            .map_err(|e| LogsError::Sink(format!("Failed to build Firehose record: {}", e)))?;

        let response = self
            .client
            .put_record()
            .delivery_stream_name(&self.delivery_stream_name)
            .record(record)
            .send()
            .await
            .map_err(|e| {
                error!("Firehose put_record error: {:?}", e);
                LogsError::Sink(format!(
                    "Failed to deliver log entry to Firehose: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        debug!(record_id = response.record_id(), "delivered log entry");
        Ok(())
    }
}

/// Firehose concatenates records, so each one carries its own line break.
fn encode_record(entry: &LogEntry) -> Result<Vec<u8>, LogsError> {
    let mut payload = serde_json::to_vec(entry)?;
    payload.push(b'\n');
    Ok(payload)
}

impl Sink for FirehoseSink {
    fn write<'a>(&'a self, entry: &'a LogEntry) -> SinkFuture<'a> {
        Box::pin(self.put(entry))
    }

    fn name(&self) -> &str {
        "firehose"
    }
}
