//! `ReAct` loop implementation.

use crate::config::RunConfig;
use crate::conversation::ConversationState;
use crate::engine::state::{AgentState, LoopState, SessionOutcome, SessionReport};
use crate::error::{AgentError, TaskError, ToolError};
use crate::inference::{ChatRequest, LLMProvider};
use crate::prompt::PromptBuilder;
use crate::tools::{ToolDefinition, ToolDispatcher};
use crate::types::Message;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Core engine that drives one bounded reasoning session per question.
pub struct AgentEngine {
    pub(crate) provider: Arc<dyn LLMProvider>,
    pub(crate) dispatcher: ToolDispatcher,
    pub(crate) config: RunConfig,
    pub(crate) tools: Vec<ToolDefinition>,
    pub(crate) system_prompt: String,
}

impl std::fmt::Debug for AgentEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentEngine")
            .field("dispatcher", &self.dispatcher)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AgentEngine {
    /// Creates a new agent engine.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        dispatcher: ToolDispatcher,
        config: RunConfig,
    ) -> Result<Self, AgentError> {
        config.validate()?;
        let tools = ToolDispatcher::definitions();

        Ok(Self {
            provider,
            dispatcher,
            config,
            tools,
            system_prompt: PromptBuilder::data_scientist(),
        })
    }

    /// Returns the run configuration.
    #[must_use]
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Answers `question`, continuing `prior` when given.
    ///
    /// The loop makes at most `max_steps` model calls. Tool failures are fed
    /// back to the model; an unknown tool ends the session.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The question is empty
    /// - The model service fails
    pub async fn run(
        &self,
        question: &str,
        prior: Option<ConversationState>,
    ) -> Result<SessionReport, AgentError> {
        if question.trim().is_empty() {
            return Err(TaskError::InvalidDescription(
                "Question cannot be empty".to_string(),
            )
            .into());
        }

        let conversation = match prior {
            Some(prior) => ConversationState::resume(prior, &self.system_prompt, question),
            None => ConversationState::fresh(&self.system_prompt, question),
        };
        let mut state = AgentState::new(conversation);
        let mut current = LoopState::AwaitingModel;

        while !current.is_terminal() {
            current = match current {
                LoopState::AwaitingModel => self.await_model(&mut state).await?,
                LoopState::DispatchingTools(calls) => self.dispatch_tools(&mut state, calls).await?,
                finished => finished,
            };
        }

        Ok(match current {
            LoopState::FinishedAnswer(answer) => self.finish_answer(state, answer),
            LoopState::FinishedUnknownTool(name) => {
                error!(tool = %name, "Model requested an unknown tool; ending session");
                report(state, SessionOutcome::UnknownTool { name }, None)
            }
            // Only FinishedMaxSteps is left once the loop exits.
            _ => {
                warn!(
                    "Reached maximum reasoning steps ({}) without a final answer",
                    self.config.max_steps
                );
                report(state, SessionOutcome::MaxStepsReached, None)
            }
        })
    }

    async fn await_model(&self, state: &mut AgentState) -> Result<LoopState, AgentError> {
        if state.step >= self.config.max_steps {
            return Ok(LoopState::FinishedMaxSteps);
        }
        state.step += 1;
        info!("Reasoning step {}/{}", state.step, self.config.max_steps);

        let request = ChatRequest::new(&self.config.model, state.conversation.messages().to_vec())
            .with_tools(self.tools.clone())
            .with_temperature(self.config.temperature)
            .with_think(self.config.thinking);
        let response = self.provider.chat(request).await?;

        if self.config.verbose
            && let Some(thinking) = response.thinking.as_deref()
        {
            info!(thinking, "Model thinking");
        }

        if response.has_tool_calls() {
            let calls = response.tool_calls;
            state
                .conversation
                .push(Message::assistant(response.content).with_tool_calls(calls.clone()));
            Ok(LoopState::DispatchingTools(calls))
        } else {
            Ok(LoopState::FinishedAnswer(response.content))
        }
    }

    async fn dispatch_tools(
        &self,
        state: &mut AgentState,
        calls: Vec<crate::types::ToolCall>,
    ) -> Result<LoopState, AgentError> {
        for call in &calls {
            match self.dispatcher.dispatch(call).await {
                Ok(message) => state.conversation.push(message),
                Err(ToolError::NotFound { name }) => {
                    return Ok(LoopState::FinishedUnknownTool(name));
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(LoopState::AwaitingModel)
    }

    fn finish_answer(&self, mut state: AgentState, answer: String) -> SessionReport {
        state.conversation.push(Message::system(answer.clone()));

        let persisted = if self.config.persist_on_finish {
            match state.conversation.persist_timestamped(&self.config.log_dir) {
                Ok(path) => {
                    info!(path = %path.display(), "Conversation history written");
                    Some(path)
                }
                Err(e) => {
                    warn!(error = %e, "Failed to write conversation history");
                    None
                }
            }
        } else {
            None
        };

        report(state, SessionOutcome::Answer(answer), persisted)
    }
}

fn report(
    state: AgentState,
    outcome: SessionOutcome,
    persisted: Option<std::path::PathBuf>,
) -> SessionReport {
    SessionReport {
        outcome,
        conversation: state.conversation,
        steps: state.step,
        persisted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InferenceError;
    use crate::inference::ChatResponse;
    use crate::tools::CodeExecutionAdapter;
    use crate::tools::python::testing::FakeSandbox;
    use crate::types::{ExecutionResult, Role, ToolCall};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Replays scripted responses; repeats the last one when exhausted.
    struct ScriptedProvider {
        responses: Mutex<VecDeque<Result<ChatResponse, InferenceError>>>,
        fallback: ChatResponse,
        calls: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedProvider {
        fn new(responses: Vec<Result<ChatResponse, InferenceError>>, fallback: ChatResponse) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                fallback,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl LLMProvider for ScriptedProvider {
        async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, InferenceError> {
            self.calls.lock().unwrap().push(request);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(self.fallback.clone()))
        }
    }

    fn python_call(code: &str) -> ToolCall {
        ToolCall::new("python_datascience")
            .with_arg("code", code)
            .with_arg("reason", "inspect")
    }

    fn sandbox_printing(stdout: &str) -> Arc<FakeSandbox> {
        Arc::new(FakeSandbox::returning(ExecutionResult {
            exit_code: 0,
            stdout: stdout.to_string(),
            ..ExecutionResult::default()
        }))
    }

    fn engine(provider: Arc<ScriptedProvider>, sandbox: Arc<FakeSandbox>, config: RunConfig) -> AgentEngine {
        let dispatcher = ToolDispatcher::new(CodeExecutionAdapter::new(sandbox, "."), &config);
        AgentEngine::new(provider, dispatcher, config).unwrap()
    }

    #[tokio::test]
    async fn test_answer_after_tool_call() {
        let provider = Arc::new(ScriptedProvider::new(
            vec![Ok(ChatResponse::tool_calls(vec![python_call("print(df.x.mean())")]))],
            ChatResponse::answer("The mean of x is 3.0"),
        ));
        let sandbox = sandbox_printing("h1\nh2\n3.0\n");
        let engine = engine(provider.clone(), sandbox.clone(), RunConfig::default());

        let report = engine.run("What is the mean of x?", None).await.unwrap();

        assert_eq!(report.answer(), Some("The mean of x is 3.0"));
        assert_eq!(report.steps, 2);
        let roles: Vec<Role> = report.conversation.messages().iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::System, Role::User, Role::Assistant, Role::ToolResult, Role::System]
        );
        assert!(report.conversation.messages()[3].content.contains("output:\n3.0"));
        assert_eq!(*sandbox.opened.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_tool_schema_sent_every_call() {
        let provider = Arc::new(ScriptedProvider::new(
            vec![Ok(ChatResponse::tool_calls(vec![python_call("print(1)")]))],
            ChatResponse::answer("done"),
        ));
        let engine = engine(provider.clone(), sandbox_printing("a\nb\n1\n"), RunConfig::default());

        engine.run("q", None).await.unwrap();

        let calls = provider.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        for request in calls.iter() {
            assert_eq!(request.tools.len(), 1);
            assert_eq!(request.tools[0].name, "python_datascience");
            assert_eq!(request.model, "gpt-oss");
        }
    }

    #[tokio::test]
    async fn test_unknown_tool_ends_session() {
        let provider = Arc::new(ScriptedProvider::new(
            vec![Ok(ChatResponse::tool_calls(vec![ToolCall::new("plot_chart")]))],
            ChatResponse::answer("unreachable"),
        ));
        let sandbox = Arc::new(FakeSandbox::default());
        let engine = engine(provider.clone(), sandbox.clone(), RunConfig::default());

        let report = engine.run("Plot x", None).await.unwrap();

        assert_eq!(
            report.outcome,
            SessionOutcome::UnknownTool {
                name: "plot_chart".to_string()
            }
        );
        assert_eq!(provider.call_count(), 1);
        assert_eq!(*sandbox.opened.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_calls_before_unknown_tool_are_kept() {
        let provider = Arc::new(ScriptedProvider::new(
            vec![Ok(ChatResponse::tool_calls(vec![
                python_call("print(1)"),
                ToolCall::new("plot_chart"),
                python_call("print(2)"),
            ]))],
            ChatResponse::answer("unreachable"),
        ));
        let sandbox = sandbox_printing("a\nb\n1\n");
        let engine = engine(provider, sandbox.clone(), RunConfig::default());

        let report = engine.run("q", None).await.unwrap();

        assert!(matches!(report.outcome, SessionOutcome::UnknownTool { .. }));
        assert_eq!(*sandbox.opened.lock().unwrap(), 1);
        assert_eq!(report.conversation.last().unwrap().role, Role::ToolResult);
    }

    #[tokio::test]
    async fn test_calls_in_one_step_dispatch_in_order() {
        let provider = Arc::new(ScriptedProvider::new(
            vec![Ok(ChatResponse::tool_calls(vec![
                python_call("print(1)"),
                python_call("print(2)"),
            ]))],
            ChatResponse::answer("Printed 1 and 2"),
        ));
        let sandbox = sandbox_printing("a\nb\nok\n");
        let engine = engine(provider.clone(), sandbox.clone(), RunConfig::default());

        let report = engine.run("Print two numbers", None).await.unwrap();

        assert_eq!(report.answer(), Some("Printed 1 and 2"));
        assert_eq!(report.steps, 2);
        assert_eq!(
            sandbox.codes.lock().unwrap().as_slice(),
            ["print(1)", "print(2)"]
        );
        // A fresh session per call.
        assert_eq!(*sandbox.opened.lock().unwrap(), 2);
        assert_eq!(*sandbox.closed.lock().unwrap(), 2);

        let messages = report.conversation.messages();
        let roles: Vec<Role> = messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                Role::System,
                Role::User,
                Role::Assistant,
                Role::ToolResult,
                Role::ToolResult,
                Role::System
            ]
        );
        assert!(messages[3].content.contains("Code:\nprint(1)\n"));
        assert!(messages[4].content.contains("Code:\nprint(2)\n"));

        // The follow-up model call sees both results.
        let calls = provider.calls.lock().unwrap();
        assert_eq!(calls[1].messages.len(), 5);
    }

    #[tokio::test]
    async fn test_max_steps_one_dispatches_once() {
        let provider = Arc::new(ScriptedProvider::new(
            Vec::new(),
            ChatResponse::tool_calls(vec![python_call("print(1)")]),
        ));
        let sandbox = sandbox_printing("a\nb\n1\n");
        let config = RunConfig::builder().max_steps(1).build().unwrap();
        let engine = engine(provider.clone(), sandbox.clone(), config);

        let report = engine.run("q", None).await.unwrap();

        assert_eq!(report.outcome, SessionOutcome::MaxStepsReached);
        assert_eq!(provider.call_count(), 1);
        assert_eq!(*sandbox.opened.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_model_calls_bounded_by_max_steps() {
        for max_steps in 1..=6 {
            let provider = Arc::new(ScriptedProvider::new(
                Vec::new(),
                ChatResponse::tool_calls(vec![python_call("print(1)")]),
            ));
            let config = RunConfig::builder().max_steps(max_steps).build().unwrap();
            let engine = engine(provider.clone(), sandbox_printing("a\nb\n"), config);

            let report = engine.run("q", None).await.unwrap();

            assert_eq!(report.outcome, SessionOutcome::MaxStepsReached);
            assert_eq!(provider.call_count(), max_steps as usize);
            assert_eq!(report.steps, max_steps);
        }
    }

    #[tokio::test]
    async fn test_inference_error_is_fatal() {
        let provider = Arc::new(ScriptedProvider::new(
            vec![Err(InferenceError::NetworkError("refused".to_string()))],
            ChatResponse::answer("unreachable"),
        ));
        let engine = engine(provider, sandbox_printing(""), RunConfig::default());

        let err = engine.run("q", None).await.unwrap_err();
        assert!(matches!(err, AgentError::Inference(InferenceError::NetworkError(_))));
    }

    #[tokio::test]
    async fn test_empty_question_rejected() {
        let provider = Arc::new(ScriptedProvider::new(Vec::new(), ChatResponse::answer("x")));
        let engine = engine(provider.clone(), sandbox_printing(""), RunConfig::default());

        assert!(matches!(
            engine.run("  ", None).await,
            Err(AgentError::Task(TaskError::InvalidDescription(_)))
        ));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_resume_extends_prior_conversation() {
        let provider = Arc::new(ScriptedProvider::new(Vec::new(), ChatResponse::answer("again")));
        let engine = engine(provider.clone(), sandbox_printing(""), RunConfig::default());

        let first = engine.run("first", None).await.unwrap();
        let prior = first.conversation.clone();
        let second = engine.run("second", Some(first.conversation)).await.unwrap();

        let messages = second.conversation.messages();
        assert_eq!(&messages[..prior.len()], prior.messages());
        assert_eq!(messages[prior.len()], Message::user("second"));
        assert_eq!(provider.calls.lock().unwrap()[1].messages.len(), prior.len() + 1);
    }

    #[tokio::test]
    async fn test_persist_on_finish() {
        let dir = TempDir::new().unwrap();
        let provider = Arc::new(ScriptedProvider::new(Vec::new(), ChatResponse::answer("42")));
        let config = RunConfig::builder()
            .persist_on_finish(true)
            .log_dir(dir.path())
            .build()
            .unwrap();
        let engine = engine(provider, sandbox_printing(""), config);

        let report = engine.run("q", None).await.unwrap();

        let path = report.persisted.clone().unwrap();
        assert!(path.starts_with(dir.path()));
        assert_eq!(ConversationState::load(&path).unwrap(), report.conversation);
    }

    #[tokio::test]
    async fn test_persist_failure_is_not_fatal() {
        let provider = Arc::new(ScriptedProvider::new(Vec::new(), ChatResponse::answer("42")));
        let config = RunConfig::builder()
            .persist_on_finish(true)
            .log_dir("/nonexistent/log/dir")
            .build()
            .unwrap();
        let engine = engine(provider, sandbox_printing(""), config);

        let report = engine.run("q", None).await.unwrap();
        assert_eq!(report.answer(), Some("42"));
        assert!(report.persisted.is_none());
    }
}
