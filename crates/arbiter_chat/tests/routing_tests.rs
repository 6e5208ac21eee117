//! Chat routing against hand-written agents.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use arbiter_agents::{
    Agent, AgentContext, AgentError, AgentRegistry, AgentResult, Capability, CapabilitySet,
    Category, RawAgentResult, CHAT_TYPE_KEY,
};
use arbiter_chat::{ChatError, ChatRouter, ChatType};
use async_trait::async_trait;

enum Reply {
    Echo,
    Fail,
    Hang,
    Panic,
}

struct ChatAgent {
    name: &'static str,
    chat: bool,
    reply: Reply,
    calls: AtomicUsize,
}

impl ChatAgent {
    fn new(name: &'static str) -> Arc<Self> {
        Self::build(name, true, Reply::Echo)
    }

    fn build(name: &'static str, chat: bool, reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            name,
            chat,
            reply,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl Agent for ChatAgent {
    fn name(&self) -> &str {
        self.name
    }

    fn capabilities(&self) -> CapabilitySet {
        let set = CapabilitySet::new().with(Capability::CodeAnalysis);
        if self.chat {
            set.with(Capability::ChatSupport)
        } else {
            set
        }
    }

    async fn analyze(
        &self,
        _path: &str,
        _content: &str,
        _context: &AgentContext,
    ) -> AgentResult<RawAgentResult> {
        Ok(RawAgentResult::new(self.name))
    }

    async fn chat(&self, context: &AgentContext) -> AgentResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.reply {
            Reply::Echo => Ok(format!(
                "{} ({})",
                context.message().unwrap_or_default(),
                context.get_str(CHAT_TYPE_KEY).unwrap_or_default()
            )),
            Reply::Fail => Err(AgentError::execution_failed(self.name, "model offline")),
            Reply::Hang => {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok("late".to_string())
            }
            Reply::Panic => panic!("{} lost its model handle", self.name),
        }
    }
}

fn registry() -> AgentRegistry {
    AgentRegistry::new()
        .with(Category::Code, ChatAgent::new("javascript_react_code"))
        .with(Category::Code, ChatAgent::new("python_code"))
        .with(Category::Testing, ChatAgent::new("javascript_react_test"))
        .with(Category::Testing, ChatAgent::new("python_test"))
        .with(Category::Security, ChatAgent::new("security_scanner"))
}

fn names(agents: &[Arc<dyn Agent>]) -> Vec<&str> {
    agents.iter().map(|a| a.name()).collect()
}

#[test]
fn test_keyword_routing_within_categories() {
    let router = ChatRouter::new(Arc::new(registry()));

    let routed = router.route("How do I memoize a React component?", ChatType::General);
    assert_eq!(names(&routed), vec!["javascript_react_code", "javascript_react_test"]);

    let routed = router.route("How do I memoize a React component?", ChatType::Code);
    assert_eq!(names(&routed), vec!["javascript_react_code"]);

    let routed = router.route("Any XSS risk in this form?", ChatType::Analysis);
    assert_eq!(names(&routed), vec!["security_scanner"]);
}

#[test]
fn test_fallback_to_first_agent_per_category() {
    let router = ChatRouter::new(Arc::new(registry()));
    let routed = router.route("what should I do next?", ChatType::Analysis);
    assert_eq!(
        names(&routed),
        vec!["javascript_react_code", "javascript_react_test", "security_scanner"]
    );
}

#[test]
fn test_agent_in_two_categories_is_routed_once() {
    let shared: Arc<dyn Agent> = ChatAgent::new("python_code");
    let registry = AgentRegistry::new()
        .with(Category::Code, Arc::clone(&shared))
        .with(Category::Testing, shared);
    let router = ChatRouter::new(Arc::new(registry));

    let routed = router.route("pytest fixture question", ChatType::General);
    assert_eq!(names(&routed), vec!["python_code"]);
}

#[test]
fn test_distinct_agents_sharing_a_name_are_both_routed() {
    let registry = AgentRegistry::new()
        .with(Category::Code, ChatAgent::new("helper"))
        .with(Category::Testing, ChatAgent::new("helper"));
    let router = ChatRouter::new(Arc::new(registry));

    let routed = router.route("hello", ChatType::General);
    assert_eq!(names(&routed), vec!["helper", "helper"]);
}

#[tokio::test]
async fn test_chat_answers_from_each_distinct_agent() {
    let code = ChatAgent::new("helper");
    let testing = ChatAgent::new("helper");
    let registry = AgentRegistry::new()
        .with(Category::Code, code.clone())
        .with(Category::Testing, testing.clone());
    let router = ChatRouter::new(Arc::new(registry));

    let response = router.chat("hello", ChatType::General, None).await.unwrap();

    assert_eq!(response.agents_used, vec!["helper", "helper"]);
    assert_eq!(
        response.response,
        "## helper\nhello (general)\n\n## helper\nhello (general)"
    );
    assert_eq!(code.calls.load(Ordering::SeqCst), 1);
    assert_eq!(testing.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_chat_merges_sections() {
    let router = ChatRouter::new(Arc::new(registry()));
    let response = router
        .chat("Why does my useEffect loop?", ChatType::General, None)
        .await
        .unwrap();

    assert!(response.success);
    assert_eq!(
        response.agents_used,
        vec!["javascript_react_code", "javascript_react_test"]
    );
    assert_eq!(
        response.response,
        "## javascript_react_code\nWhy does my useEffect loop? (general)\n\n\
         ## javascript_react_test\nWhy does my useEffect loop? (general)"
    );
    assert!(response.errors.is_empty());
}

#[tokio::test]
async fn test_agents_without_chat_are_skipped() {
    let silent = ChatAgent::build("python_code", false, Reply::Echo);
    let registry = AgentRegistry::new().with(Category::Code, silent.clone());
    let router = ChatRouter::new(Arc::new(registry));

    let response = router.chat("python question", ChatType::Code, None).await.unwrap();

    assert!(!response.success);
    assert!(response.agents_used.is_empty());
    assert!(response.response.is_empty());
    assert_eq!(silent.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_failures_and_timeouts_are_reported() {
    let registry = AgentRegistry::new()
        .with(Category::Code, ChatAgent::build("python_code", true, Reply::Fail))
        .with(Category::Testing, ChatAgent::build("python_test", true, Reply::Hang))
        .with(Category::Testing, ChatAgent::new("javascript_react_test"));
    let router =
        ChatRouter::new(Arc::new(registry)).with_timeout(Duration::from_millis(100));

    let response = router
        .chat("python and jest", ChatType::General, None)
        .await
        .unwrap();

    assert!(response.success);
    assert_eq!(
        response.agents_used,
        vec!["python_code", "python_test", "javascript_react_test"]
    );
    assert_eq!(
        response.errors,
        vec![
            "Agent execution failed: python_code - model offline".to_string(),
            "Agent python_test timed out after 0.1s".to_string(),
        ]
    );
    assert!(response.response.starts_with("## javascript_react_test\n"));
}

#[tokio::test]
async fn test_empty_message_and_empty_registry() {
    let router = ChatRouter::new(Arc::new(registry()));
    let err = router.chat("   ", ChatType::Code, None).await.unwrap_err();
    assert!(matches!(err, ChatError::EmptyMessage));

    let router = ChatRouter::new(Arc::new(AgentRegistry::new()));
    let err = router.chat("hi", ChatType::Code, None).await.unwrap_err();
    assert_eq!(err.to_string(), "No agents registered for: code");
}

#[tokio::test]
async fn test_caller_context_is_extended() {
    let router = ChatRouter::new(Arc::new(registry()));
    let context = AgentContext::new().with_value("project", &"shop");
    let response = router
        .chat("python typing", ChatType::Code, Some(context))
        .await
        .unwrap();
    assert_eq!(response.agents_used, vec!["python_code"]);
    assert_eq!(response.response, "## python_code\npython typing (code)");
}

#[tokio::test]
async fn test_panicking_agent_does_not_abort_chat() {
    let registry = AgentRegistry::new()
        .with(Category::Code, ChatAgent::new("python_code"))
        .with(Category::Testing, ChatAgent::build("python_test", true, Reply::Panic));
    let router = ChatRouter::new(Arc::new(registry));

    let response = router
        .chat("python question", ChatType::General, None)
        .await
        .unwrap();

    assert!(response.success);
    assert_eq!(response.agents_used, vec!["python_code", "python_test"]);
    assert_eq!(response.response, "## python_code\npython question (general)");
    assert_eq!(response.errors, vec!["Agent python_test panicked during chat"]);
}
