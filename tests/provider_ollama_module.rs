use traceflow::config::ResourceConfig;
use traceflow::engine::{Capability, CapabilityError};
use traceflow::provider::{OllamaCapability, DEFAULT_OLLAMA_BASE_URL};

#[test]
fn resources_without_a_model_fail_before_any_request() {
    let capability = OllamaCapability::new();
    let resource: ResourceConfig =
        serde_yaml::from_str("id: writer\nprovider: ollama").expect("resource");

    let err = capability
        .invoke("Summarize the findings", &resource)
        .expect_err("missing model");
    match err {
        CapabilityError::Invocation(reason) => {
            assert!(reason.contains("resource `writer` declares no model"));
        }
        CapabilityError::Transport(reason) => panic!("unexpected transport error: {reason}"),
    }
}

#[test]
fn default_base_url_targets_the_local_server() {
    assert_eq!(DEFAULT_OLLAMA_BASE_URL, "http://localhost:11434");
}
