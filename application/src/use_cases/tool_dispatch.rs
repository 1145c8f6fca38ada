//! Tool dispatch
//!
//! Executes validated [`ToolCommand`]s on behalf of an agent. Each command
//! maps onto a Shared Interface, file store or knowledge operation. Failures
//! never propagate: they come back as an activity line and a tool message
//! so the agent can see what went wrong on its next pass.

use super::shared_interface::{InterfaceError, SharedInterface};
use crate::ports::file_store::FileStorePort;
use crate::ports::knowledge::KnowledgeLookupPort;
use polis_domain::{
    Agent, Attachment, Credential, Participant, SPAWN_PERSONA, ThreadId, ToolCommand, ToolSpec,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What a dispatched tool call produced.
#[derive(Debug)]
pub struct ToolOutcome {
    /// Line for the caller's activity log.
    pub activity: String,
    /// Content for a `tool` message in the caller's buffer.
    pub tool_message: Option<String>,
    /// Agent created by `create_agent`, to be added to the population.
    pub spawned: Option<Agent>,
    pub succeeded: bool,
}

/// Result of a command that went through.
struct Effect {
    activity: String,
    result: String,
    spawned: Option<Agent>,
}

impl Effect {
    fn new(activity: impl Into<String>) -> Self {
        let activity = activity.into();
        Self {
            result: activity.clone(),
            activity,
            spawned: None,
        }
    }

    fn with_result(mut self, result: impl Into<String>) -> Self {
        self.result = result.into();
        self
    }
}

/// Executes tool commands against the community collaborators.
pub struct ToolDispatcher {
    interface: Arc<SharedInterface>,
    tool_spec: ToolSpec,
    files: Option<Arc<dyn FileStorePort>>,
    knowledge: Option<Arc<dyn KnowledgeLookupPort>>,
}

impl ToolDispatcher {
    pub fn new(interface: Arc<SharedInterface>, tool_spec: ToolSpec) -> Self {
        Self {
            interface,
            tool_spec,
            files: None,
            knowledge: None,
        }
    }

    pub fn with_files(mut self, files: Arc<dyn FileStorePort>) -> Self {
        self.files = Some(files);
        self
    }

    pub fn with_knowledge(mut self, knowledge: Arc<dyn KnowledgeLookupPort>) -> Self {
        self.knowledge = Some(knowledge);
        self
    }

    pub fn interface(&self) -> &Arc<SharedInterface> {
        &self.interface
    }

    /// Create a new agent with a fresh credential and join it.
    pub async fn spawn(
        &self,
        name: &str,
        initial_instructions: &str,
        initial_notes: Vec<String>,
    ) -> Result<Agent, InterfaceError> {
        let secret: [u8; 32] = rand::random();
        let participant = Participant::new(name, Credential::new(hex::encode(secret)));

        let mut agent = Agent::new(
            participant,
            SPAWN_PERSONA,
            initial_instructions,
            initial_notes,
        );
        self.interface
            .join(agent.participant(), Some(agent.persona()))
            .await?;
        agent.set_joined(true);

        self.record_activity(&agent, format!("Agent {} created", name))
            .await;
        info!("Spawned agent {}", name);
        Ok(agent)
    }

    /// Run one command for `agent`.
    ///
    /// A tool message is produced for data-returning tools, and for every
    /// failure.
    pub async fn dispatch(&self, agent: &mut Agent, command: ToolCommand) -> ToolOutcome {
        let name = command.name();
        let returns_data = self
            .tool_spec
            .get(name)
            .is_some_and(|tool| tool.returns_data());
        debug!("{} calls {}", agent.name(), name);

        match self.execute(agent, command).await {
            Ok(effect) => ToolOutcome {
                tool_message: returns_data.then_some(effect.result),
                activity: effect.activity,
                spawned: effect.spawned,
                succeeded: true,
            },
            Err(error) => {
                warn!("Tool {} failed for {}: {}", name, agent.name(), error);
                let message = format!("Tool {} failed: {}", name, error);
                ToolOutcome {
                    activity: message.clone(),
                    tool_message: Some(message),
                    spawned: None,
                    succeeded: false,
                }
            }
        }
    }

    /// Append to the agent's activity log, logging store faults.
    pub async fn record_activity(&self, agent: &Agent, activity: impl Into<String>) {
        if let Err(e) = self
            .interface
            .add_activity(agent.participant(), activity)
            .await
        {
            debug!("Could not record activity for {}: {}", agent.name(), e);
        }
    }

    async fn execute(&self, agent: &mut Agent, command: ToolCommand) -> Result<Effect, String> {
        let ui = &self.interface;
        match command {
            ToolCommand::CreateAgent {
                name,
                initial_instructions,
                initial_notes,
            } => {
                let spawned = self
                    .spawn(&name, &initial_instructions, initial_notes)
                    .await
                    .map_err(|e| e.to_string())?;
                let mut effect = Effect::new(format!("Created agent {}", name));
                effect.spawned = Some(spawned);
                Ok(effect)
            }
            ToolCommand::SetPersona { persona } => {
                ui.update_persona(agent.participant(), &persona)
                    .await
                    .map_err(|e| e.to_string())?;
                agent.set_persona(persona.clone());
                Ok(Effect::new(format!("Set persona to {}", persona)))
            }
            ToolCommand::SetName { name } => {
                ui.update_name(agent.participant(), &name)
                    .await
                    .map_err(|e| e.to_string())?;
                agent.rename(name.clone());
                Ok(Effect::new(format!("Set name to {}", name)))
            }
            ToolCommand::Join => {
                ui.join(agent.participant(), Some(agent.persona()))
                    .await
                    .map_err(|e| e.to_string())?;
                agent.set_joined(true);
                Ok(Effect::new(format!("Agent {} joined", agent.name())))
            }
            ToolCommand::Leave => {
                ui.leave(agent.participant())
                    .await
                    .map_err(|e| e.to_string())?;
                agent.set_joined(false);
                Ok(Effect::new(format!("Agent {} left", agent.name())))
            }
            ToolCommand::PostToForum { content } => {
                ui.post_to_forum(agent.participant(), &content, None)
                    .await
                    .map_err(|e| e.to_string())?;
                Ok(Effect::new(format!("Posted to forum: {}", content)))
            }
            ToolCommand::PostToChat { content } => {
                ui.post_to_chat(agent.participant(), &content)
                    .await
                    .map_err(|e| e.to_string())?;
                Ok(Effect::new(format!("Posted to chat: {}", content)))
            }
            ToolCommand::GetForumPosts { limit } => {
                let threads = ui.get_forum_posts(limit).await;
                Ok(Effect::new("Got forum posts").with_result(to_json(&threads)?))
            }
            ToolCommand::GetForumPost { thread_id } => {
                let thread = ui
                    .get_forum_post(&ThreadId::new(thread_id.clone()))
                    .await
                    .map_err(|e| e.to_string())?;
                Ok(Effect::new(format!("Got forum post: {}", thread_id))
                    .with_result(to_json(&thread)?))
            }
            ToolCommand::GetChatHistory { limit } => {
                let messages = ui.get_chat_history(limit).await;
                Ok(Effect::new("Got chat history").with_result(to_json(&messages)?))
            }
            ToolCommand::PostReply { thread_id, content } => {
                ui.post_reply(&ThreadId::new(thread_id), agent.participant(), &content, None)
                    .await
                    .map_err(|e| e.to_string())?;
                Ok(Effect::new(format!("Posted reply: {}", content)))
            }
            ToolCommand::CreateTextFile { filename, content } => {
                let file = self
                    .files()?
                    .create_text_file(&filename, &content)
                    .await
                    .map_err(|e| e.to_string())?;
                Ok(Effect::new(format!("Created text file: {}", file.name)))
            }
            ToolCommand::CreateImageFile { filename, content } => {
                let file = self
                    .files()?
                    .create_image_file(&filename, &content)
                    .await
                    .map_err(|e| e.to_string())?;
                Ok(Effect::new(format!("Created image file: {}", file.name)))
            }
            ToolCommand::GetFile { file_url } => {
                let files = self.files()?;
                let file = files.get_file(&file_url).await.map_err(|e| e.to_string())?;
                let result = if is_text(&file) {
                    files.read_text(&file_url).await.map_err(|e| e.to_string())?
                } else {
                    format!(
                        "File {} ({}, {} bytes) cannot be shown as text",
                        file.name, file.media_type, file.size
                    )
                };
                Ok(Effect::new(format!("Got file: {}", file_url)).with_result(result))
            }
            ToolCommand::GetFileList => {
                let names = self
                    .files()?
                    .list_files()
                    .await
                    .map_err(|e| e.to_string())?;
                Ok(Effect::new("Got file list").with_result(to_json(&names)?))
            }
            ToolCommand::GetWikipediaText { title } => {
                let knowledge = self
                    .knowledge
                    .as_ref()
                    .ok_or_else(|| "Knowledge lookup is not available".to_string())?;
                let text = knowledge.lookup(&title).await.map_err(|e| e.to_string())?;
                Ok(Effect::new(format!("Got wikipedia text: {}", title)).with_result(text))
            }
        }
    }

    fn files(&self) -> Result<&Arc<dyn FileStorePort>, String> {
        self.files
            .as_ref()
            .ok_or_else(|| "File storage is not available".to_string())
    }
}

fn is_text(file: &Attachment) -> bool {
    file.media_type.starts_with("text/")
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::file_store::FileStoreError;
    use crate::ports::knowledge::KnowledgeError;
    use crate::test_support::MockStore;
    use async_trait::async_trait;
    use polis_domain::{ToolCall, community_tool_spec};
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryFiles {
        files: Mutex<HashMap<String, (String, u64)>>,
    }

    #[async_trait]
    impl FileStorePort for MemoryFiles {
        async fn create_text_file(
            &self,
            filename: &str,
            content: &str,
        ) -> Result<Attachment, FileStoreError> {
            self.files
                .lock()
                .unwrap()
                .insert(filename.to_string(), (content.to_string(), content.len() as u64));
            Ok(Attachment::uploaded(filename, content.len() as u64))
        }

        async fn create_image_file(
            &self,
            filename: &str,
            _base64_content: &str,
        ) -> Result<Attachment, FileStoreError> {
            self.files
                .lock()
                .unwrap()
                .insert(filename.to_string(), (String::new(), 4));
            Ok(Attachment::uploaded(filename, 4))
        }

        async fn get_file(&self, file_url: &str) -> Result<Attachment, FileStoreError> {
            let name = file_url.trim_start_matches("/uploads/");
            let files = self.files.lock().unwrap();
            let (_, size) = files
                .get(name)
                .ok_or_else(|| FileStoreError::NotFound(file_url.to_string()))?;
            Ok(Attachment::uploaded(name, *size))
        }

        async fn read_text(&self, file_url: &str) -> Result<String, FileStoreError> {
            let name = file_url.trim_start_matches("/uploads/");
            let files = self.files.lock().unwrap();
            files
                .get(name)
                .map(|(content, _)| content.clone())
                .ok_or_else(|| FileStoreError::NotFound(file_url.to_string()))
        }

        async fn list_files(&self) -> Result<Vec<String>, FileStoreError> {
            let mut names: Vec<_> = self.files.lock().unwrap().keys().cloned().collect();
            names.sort();
            Ok(names)
        }
    }

    struct Encyclopedia;

    #[async_trait]
    impl KnowledgeLookupPort for Encyclopedia {
        async fn lookup(&self, title: &str) -> Result<String, KnowledgeError> {
            match title {
                "Rust" => Ok("Rust is a systems programming language.".to_string()),
                other => Err(KnowledgeError::NotFound(other.to_string())),
            }
        }
    }

    fn dispatcher() -> ToolDispatcher {
        let store = Arc::new(MockStore::new());
        let interface = Arc::new(SharedInterface::new(store));
        ToolDispatcher::new(interface, community_tool_spec(true))
            .with_files(Arc::new(MemoryFiles::default()))
            .with_knowledge(Arc::new(Encyclopedia))
    }

    fn command(call: ToolCall) -> ToolCommand {
        ToolCommand::from_call(&community_tool_spec(true), &call).unwrap()
    }

    async fn spawned(dispatcher: &ToolDispatcher, name: &str) -> Agent {
        dispatcher.spawn(name, "Look around.", vec![]).await.unwrap()
    }

    #[tokio::test]
    async fn test_spawn_joins_with_fresh_identity() {
        let dispatcher = dispatcher();
        let first = spawned(&dispatcher, "Ada").await;
        let second = spawned(&dispatcher, "Ada").await;

        assert!(first.has_joined());
        assert_eq!(first.persona(), SPAWN_PERSONA);
        assert_ne!(first.participant().identity(), second.participant().identity());
        assert_eq!(first.participant().credential().expose_secret().len(), 64);

        let members = dispatcher.interface().active_members().await;
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].activity.to_vec(), vec!["Agent Ada created"]);
    }

    #[tokio::test]
    async fn test_create_agent_returns_spawned_agent() {
        let dispatcher = dispatcher();
        let mut parent = spawned(&dispatcher, "Parent").await;

        let outcome = dispatcher
            .dispatch(
                &mut parent,
                command(
                    ToolCall::new("create_agent")
                        .with_arg("name", "Child")
                        .with_arg("initial_instructions", "Explore")
                        .with_arg("initial_notes", vec!["be kind"]),
                ),
            )
            .await;

        assert!(outcome.succeeded);
        assert_eq!(outcome.activity, "Created agent Child");
        assert!(outcome.tool_message.is_none());
        let child = outcome.spawned.unwrap();
        assert_eq!(child.name(), "Child");
        assert_eq!(child.notes().iter().collect::<Vec<_>>(), vec!["be kind"]);
    }

    #[tokio::test]
    async fn test_query_tools_return_data() {
        let dispatcher = dispatcher();
        let mut ada = spawned(&dispatcher, "Ada").await;

        let posted = dispatcher
            .dispatch(
                &mut ada,
                command(ToolCall::new("post_to_forum").with_arg("content", "Hello forum")),
            )
            .await;
        assert!(posted.succeeded);
        assert_eq!(posted.activity, "Posted to forum: Hello forum");
        assert!(posted.tool_message.is_none());

        let page = dispatcher
            .dispatch(&mut ada, command(ToolCall::new("get_forum_posts")))
            .await;
        assert_eq!(page.activity, "Got forum posts");
        let threads: serde_json::Value =
            serde_json::from_str(&page.tool_message.unwrap()).unwrap();
        assert_eq!(threads[0]["op"]["content"], "Hello forum");
        assert_eq!(threads[0]["op"]["author"], "[Agent] Ada");
    }

    #[tokio::test]
    async fn test_failures_become_tool_messages() {
        let dispatcher = dispatcher();
        let mut ada = spawned(&dispatcher, "Ada").await;

        let outcome = dispatcher
            .dispatch(
                &mut ada,
                command(
                    ToolCall::new("post_reply")
                        .with_arg("thread_id", "missing")
                        .with_arg("content", "anyone?"),
                ),
            )
            .await;

        assert!(!outcome.succeeded);
        assert!(outcome.activity.contains("post_reply"));
        assert!(outcome.tool_message.unwrap().contains("not found"));
    }

    #[tokio::test]
    async fn test_set_name_and_persona_update_record_and_agent() {
        let dispatcher = dispatcher();
        let mut ada = spawned(&dispatcher, "Ada").await;

        dispatcher
            .dispatch(&mut ada, command(ToolCall::new("set_name").with_arg("name", "Lovelace")))
            .await;
        dispatcher
            .dispatch(
                &mut ada,
                command(ToolCall::new("set_persona").with_arg("persona", "A poet")),
            )
            .await;

        assert_eq!(ada.name(), "Lovelace");
        assert_eq!(ada.persona(), "A poet");
        let members = dispatcher.interface().active_members().await;
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].name, "Lovelace");
        assert_eq!(members[0].persona, "A poet");
    }

    #[tokio::test]
    async fn test_failed_persona_update_keeps_runtime_persona() {
        let store = Arc::new(MockStore::new());
        let dispatcher = ToolDispatcher::new(
            Arc::new(SharedInterface::new(store.clone())),
            community_tool_spec(true),
        );
        let mut ada = spawned(&dispatcher, "Ada").await;

        store.set_failing(true);
        let outcome = dispatcher
            .dispatch(
                &mut ada,
                command(ToolCall::new("set_persona").with_arg("persona", "A poet")),
            )
            .await;
        store.set_failing(false);

        assert!(!outcome.succeeded);
        assert_eq!(ada.persona(), SPAWN_PERSONA);
        let members = dispatcher.interface().active_members().await;
        assert_eq!(members[0].persona, SPAWN_PERSONA);
    }

    #[tokio::test]
    async fn test_leave_then_post_fails() {
        let dispatcher = dispatcher();
        let mut ada = spawned(&dispatcher, "Ada").await;

        let left = dispatcher
            .dispatch(&mut ada, command(ToolCall::new("leave")))
            .await;
        assert_eq!(left.activity, "Agent Ada left");
        assert!(!ada.has_joined());

        let chat = dispatcher
            .dispatch(
                &mut ada,
                command(ToolCall::new("post_to_chat").with_arg("content", "still here?")),
            )
            .await;
        assert!(!chat.succeeded);

        let rejoined = dispatcher
            .dispatch(&mut ada, command(ToolCall::new("join")))
            .await;
        assert!(rejoined.succeeded);
        assert!(ada.has_joined());
    }

    #[tokio::test]
    async fn test_file_tools() {
        let dispatcher = dispatcher();
        let mut ada = spawned(&dispatcher, "Ada").await;

        let created = dispatcher
            .dispatch(
                &mut ada,
                command(
                    ToolCall::new("create_text_file")
                        .with_arg("filename", "poem.txt")
                        .with_arg("content", "roses are red"),
                ),
            )
            .await;
        assert_eq!(created.activity, "Created text file: poem.txt");
        assert_eq!(created.tool_message.as_deref(), Some("Created text file: poem.txt"));

        let text = dispatcher
            .dispatch(
                &mut ada,
                command(ToolCall::new("get_file").with_arg("file_url", "/uploads/poem.txt")),
            )
            .await;
        assert_eq!(text.tool_message.as_deref(), Some("roses are red"));

        dispatcher
            .dispatch(
                &mut ada,
                command(
                    ToolCall::new("create_image_file")
                        .with_arg("filename", "cat.png")
                        .with_arg("content", "aGVsbG8="),
                ),
            )
            .await;
        let image = dispatcher
            .dispatch(
                &mut ada,
                command(ToolCall::new("get_file").with_arg("file_url", "/uploads/cat.png")),
            )
            .await;
        assert!(image.tool_message.unwrap().contains("image/png"));

        let list = dispatcher
            .dispatch(&mut ada, command(ToolCall::new("get_file_list")))
            .await;
        assert_eq!(list.tool_message.as_deref(), Some(r#"["cat.png","poem.txt"]"#));
    }

    #[tokio::test]
    async fn test_knowledge_lookup() {
        let dispatcher = dispatcher();
        let mut ada = spawned(&dispatcher, "Ada").await;

        let found = dispatcher
            .dispatch(
                &mut ada,
                command(ToolCall::new("get_wikipedia_text").with_arg("title", "Rust")),
            )
            .await;
        assert_eq!(found.activity, "Got wikipedia text: Rust");
        assert!(found.tool_message.unwrap().starts_with("Rust is"));

        let missing = dispatcher
            .dispatch(
                &mut ada,
                command(ToolCall::new("get_wikipedia_text").with_arg("title", "Nope")),
            )
            .await;
        assert!(!missing.succeeded);
    }

    #[tokio::test]
    async fn test_missing_file_store() {
        let store = Arc::new(MockStore::new());
        let dispatcher = ToolDispatcher::new(
            Arc::new(SharedInterface::new(store)),
            community_tool_spec(false),
        );
        let mut ada = spawned(&dispatcher, "Ada").await;

        let outcome = dispatcher
            .dispatch(&mut ada, command(ToolCall::new("get_file_list")))
            .await;

        assert!(!outcome.succeeded);
        assert!(outcome.tool_message.unwrap().contains("not available"));
    }
}
