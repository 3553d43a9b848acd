use crate::error::AgentRuntimeError;
use crate::models::{Citation, GeneratedAnswer, RetrieveAndGenerateRequest};
use crate::KnowledgeBaseRuntime;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_bedrockagentruntime::error::DisplayErrorContext;
use aws_sdk_bedrockagentruntime::operation::retrieve_and_generate::RetrieveAndGenerateOutput;
use aws_sdk_bedrockagentruntime::types::{
    GenerationConfiguration, KnowledgeBaseRetrievalConfiguration,
    KnowledgeBaseRetrieveAndGenerateConfiguration, KnowledgeBaseVectorSearchConfiguration,
    PromptTemplate, RetrieveAndGenerateConfiguration, RetrieveAndGenerateInput,
    RetrieveAndGenerateType,
};
use aws_sdk_bedrockagentruntime::Client;
use log::{error, info};

pub struct BedrockKnowledgeBaseClient {
    client: Client,
}

impl BedrockKnowledgeBaseClient {
    pub async fn new_with_region(region: &str) -> Self {
        info!("Initializing BedrockKnowledgeBaseClient");
        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_config::Region::new(region.to_string()))
            .load()
            .await;

        Self {
            client: Client::new(&aws_config),
        }
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    fn build_configuration(
        request: &RetrieveAndGenerateRequest,
    ) -> Result<RetrieveAndGenerateConfiguration, AgentRuntimeError> {
        let retrieval = KnowledgeBaseRetrievalConfiguration::builder()
            .vector_search_configuration(
                KnowledgeBaseVectorSearchConfiguration::builder()
                    .number_of_results(request.number_of_results)
                    .build(),
            )
            .build();

        let mut kb_config = KnowledgeBaseRetrieveAndGenerateConfiguration::builder()
            .knowledge_base_id(&request.knowledge_base_id)
            .model_arn(&request.model_arn)
            .retrieval_configuration(retrieval);

        if let Some(template) = &request.prompt_template {
            kb_config = kb_config.generation_configuration(
                GenerationConfiguration::builder()
                    .prompt_template(
                        PromptTemplate::builder()
                            .text_prompt_template(template)
                            .build(),
                    )
                    .build(),
            );
        }

        let kb_config = kb_config
            .build()
            .map_err(|e| AgentRuntimeError::InvalidRequest(e.to_string()))?;

        RetrieveAndGenerateConfiguration::builder()
            .r#type(RetrieveAndGenerateType::KnowledgeBase)
            .knowledge_base_configuration(kb_config)
            .build()
            .map_err(|e| AgentRuntimeError::InvalidRequest(e.to_string()))
    }
}

fn convert_output(output: &RetrieveAndGenerateOutput) -> GeneratedAnswer {
    let text = output
        .output()
        .map(|generated| generated.text().to_string())
        .unwrap_or_default();

    let citations = output
        .citations()
        .iter()
        .flat_map(|citation| citation.retrieved_references())
        .map(|reference| Citation {
            text: reference
                .content()
                .map(|content| content.text())
                .unwrap_or_default()
                .to_string(),
            source_uri: reference
                .location()
                .and_then(|location| location.s3_location())
                .and_then(|s3| s3.uri())
                .map(str::to_string),
        })
        .collect();

    GeneratedAnswer {
        text,
        citations,
        session_id: Some(output.session_id().to_string()),
    }
}

#[async_trait]
impl KnowledgeBaseRuntime for BedrockKnowledgeBaseClient {
    async fn retrieve_and_generate(
        &self,
        request: RetrieveAndGenerateRequest,
    ) -> Result<GeneratedAnswer, AgentRuntimeError> {
        request.validate()?;

        let input = RetrieveAndGenerateInput::builder()
            .text(&request.query)
            .build()
            .map_err(|e| AgentRuntimeError::InvalidRequest(e.to_string()))?;
        let configuration = Self::build_configuration(&request)?;

        info!(
            "Querying knowledge base {} for {} results",
            request.knowledge_base_id, request.number_of_results
        );
        let response = self
            .client
            .retrieve_and_generate()
            .input(input)
            .retrieve_and_generate_configuration(configuration)
            .set_session_id(request.session_id.clone())
            .send()
            .await
            .map_err(|e| {
                error!("Bedrock retrieve_and_generate error: {:?}", e);
                AgentRuntimeError::Api(DisplayErrorContext(&e).to_string())
            })?;

        Ok(convert_output(&response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(prompt_template: Option<&str>) -> RetrieveAndGenerateRequest {
        RetrieveAndGenerateRequest {
            query: "How many vacation days?".to_string(),
            knowledge_base_id: "KB789".to_string(),
            model_arn: "arn:aws:bedrock:us-east-1::foundation-model/anthropic.claude-v2"
                .to_string(),
            number_of_results: 3,
            prompt_template: prompt_template.map(str::to_string),
            session_id: None,
        }
    }

    #[test]
    fn should_build_knowledge_base_configuration() {
        let configuration =
            BedrockKnowledgeBaseClient::build_configuration(&request(None)).unwrap();

        assert_eq!(configuration.r#type(), &RetrieveAndGenerateType::KnowledgeBase);
        let kb = configuration.knowledge_base_configuration().unwrap();
        assert_eq!(kb.knowledge_base_id(), "KB789");
        assert!(kb.generation_configuration().is_none());
        let results = kb
            .retrieval_configuration()
            .and_then(|r| r.vector_search_configuration())
            .map(|v| v.number_of_results());
        assert_eq!(results, Some(3));
    }

    #[test]
    fn should_attach_prompt_template_when_configured() {
        let configuration = BedrockKnowledgeBaseClient::build_configuration(&request(Some(
            "Use $search_results$ to answer",
        )))
        .unwrap();

        let kb = configuration.knowledge_base_configuration().unwrap();
        assert!(kb.generation_configuration().is_some());
    }

    #[tokio::test]
    async fn should_reject_blank_query_before_calling_bedrock() {
        let client = BedrockKnowledgeBaseClient::new_with_region("us-east-1").await;
        let mut blank = request(None);
        blank.query = "   ".to_string();

        let result = client.retrieve_and_generate(blank).await;

        assert!(matches!(result, Err(AgentRuntimeError::InvalidRequest(_))));
    }
}
