//! The crate root must expose exactly the six wrapper types, each the
//! same type as the one defined in its source crate.

use std::any::TypeId;

fn same_type<A: 'static, B: 'static>() -> bool {
    TypeId::of::<A>() == TypeId::of::<B>()
}

#[test]
fn re_exports_are_the_source_types() {
    assert!(same_type::<
        llmwrap::HfApiFeatureExtractionTask,
        llmwrap_hf::api::HfApiFeatureExtractionTask,
    >());
    assert!(same_type::<
        llmwrap::HfApiTextGenerationTask,
        llmwrap_hf::api::HfApiTextGenerationTask,
    >());
    assert!(same_type::<
        llmwrap::HfFeatureExtractionTask,
        llmwrap_hf::local::HfFeatureExtractionTask,
    >());
    assert!(same_type::<
        llmwrap::HfTextGenerationTask,
        llmwrap_hf::local::HfTextGenerationTask,
    >());
    assert!(same_type::<
        llmwrap::OpenAiChatModel,
        llmwrap_openai::chat::OpenAiChatModel,
    >());
    assert!(same_type::<
        llmwrap::OpenAiEmbeddingModel,
        llmwrap_openai::embedding::OpenAiEmbeddingModel,
    >());
}

#[test]
fn wrappers_construct_and_advertise_their_task() {
    use llmwrap::{FeatureExtractionTask, TextGenerationTask};

    let extraction =
        llmwrap::HfApiFeatureExtractionTask::new("BAAI/bge-base-en-v1.5", Some("hf_x".into()));
    assert!(extraction.caps().feature_extraction);
    assert!(!extraction.caps().text_generation);

    let generation =
        llmwrap::HfApiTextGenerationTask::new("mistralai/Mistral-7B-v0.1", Some("hf_x".into()));
    assert!(generation.caps().text_generation);

    let local = llmwrap::HfTextGenerationTask::new();
    assert_eq!(local.status(), llmwrap::PipelineStatus::Unloaded);
}

#[test]
fn wrappers_coerce_to_their_contract_objects() {
    use llmwrap::{FeatureExtractionTask, TextGenerationTask};

    let extraction: Box<dyn FeatureExtractionTask> = Box::new(
        llmwrap::HfApiFeatureExtractionTask::new("BAAI/bge-base-en-v1.5", Some("hf_x".into())),
    );
    assert!(extraction.dimension().is_some());

    let generation: Box<dyn TextGenerationTask> =
        Box::new(llmwrap::HfTextGenerationTask::new());
    assert!(generation.caps().text_generation);
}
