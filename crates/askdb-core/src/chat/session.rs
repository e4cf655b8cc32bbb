//! Multi-turn chat over the database.
//!
//! Unlike [`QueryPipeline::run`], every step of a chat exchange is sent
//! with the whole conversation so far, and every prompt and reply becomes a
//! turn: user question, assistant SQL, (repair request, corrected SQL),
//! answer request, assistant answer.

use tracing::{Instrument, info, warn};

use askdb_types::error::PipelineError;
use askdb_types::llm::Message;
use askdb_types::query::{QueryAnswer, QueryResult, RepairAttempt};

use crate::database::SqlDatabase;
use crate::llm::request::collect_text_stream;
use crate::pipeline::{OP_ANSWER, OP_GENERATE_SQL, OP_REPAIR_SQL, QueryPipeline};
use crate::prompt;

use super::conversation::Conversation;

/// One interactive session. Owns its history exclusively.
pub struct ChatSession<D> {
    pipeline: QueryPipeline<D>,
    conversation: Conversation,
    schema_text: Option<String>,
    last_sql: Option<String>,
}

impl<D: SqlDatabase> ChatSession<D> {
    pub fn new(pipeline: QueryPipeline<D>) -> Self {
        Self {
            pipeline,
            conversation: Conversation::new(),
            schema_text: None,
            last_sql: None,
        }
    }

    pub fn pipeline(&self) -> &QueryPipeline<D> {
        &self.pipeline
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Schema text the system turn was built from, once the session started.
    pub fn schema_text(&self) -> Option<&str> {
        self.schema_text.as_deref()
    }

    /// The statement whose rows fed the most recent answer.
    pub fn last_sql(&self) -> Option<&str> {
        self.last_sql.as_deref()
    }

    /// Drop every turn except the system turn.
    pub fn reset(&mut self) {
        self.conversation.reset();
        self.last_sql = None;
    }

    /// Ask one question and wait for the full answer.
    pub async fn ask(&mut self, question: &str) -> Result<QueryAnswer, PipelineError> {
        self.ask_inner(question, None).await
    }

    /// Ask one question, forwarding answer text to `on_delta` as it arrives.
    pub async fn ask_streaming<F>(
        &mut self,
        question: &str,
        mut on_delta: F,
    ) -> Result<QueryAnswer, PipelineError>
    where
        F: FnMut(&str),
    {
        let on_delta: &mut dyn FnMut(&str) = &mut on_delta;
        self.ask_inner(question, Some(on_delta)).await
    }

    async fn ask_inner(
        &mut self,
        question: &str,
        on_delta: Option<&mut dyn FnMut(&str)>,
    ) -> Result<QueryAnswer, PipelineError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(PipelineError::EmptyQuestion);
        }

        self.ensure_system_turn(question).await?;

        let mark = self.conversation.len();
        match self.exchange(question, on_delta).await {
            Ok(answer) => {
                self.last_sql = Some(answer.sql.clone());
                Ok(answer)
            }
            Err(e) => {
                warn!(
                    error = %e,
                    rolled_back = self.conversation.len() - mark,
                    "chat exchange failed"
                );
                self.conversation.truncate(mark);
                Err(e)
            }
        }
    }

    /// The system turn is built once, from the first question's schema context.
    async fn ensure_system_turn(&mut self, question: &str) -> Result<(), PipelineError> {
        if self.conversation.has_system() {
            return Ok(());
        }
        let schema_text = self.pipeline.schema_context(question).await?;
        self.conversation = Conversation::with_system(prompt::sql_system_prompt(
            self.pipeline.dialect(),
            &schema_text,
        ));
        self.schema_text = Some(schema_text);
        info!("chat session started");
        Ok(())
    }

    async fn exchange(
        &mut self,
        question: &str,
        on_delta: Option<&mut dyn FnMut(&str)>,
    ) -> Result<QueryAnswer, PipelineError> {
        self.conversation.push(Message::user(question));
        let sql = self.next_sql(OP_GENERATE_SQL).await?;
        info!(sql = %sql, "first sql");

        let executed = self.pipeline.database().execute(&sql).await;
        let (sql, repair, result) = match executed {
            Ok(result) => (sql, None, result),
            Err(e) if e.is_execution() => {
                warn!(error = %e, "generated sql failed, asking for a corrected query");
                let error = e.to_string();
                self.conversation
                    .push(Message::user(prompt::repair_prompt(question, &sql, &error)));
                let updated = self.next_sql(OP_REPAIR_SQL).await?;
                info!(sql = %updated, "updated sql");
                let result: QueryResult = self.pipeline.database().execute(&updated).await?;
                let repair = RepairAttempt {
                    failed_sql: sql,
                    error,
                };
                (updated, Some(repair), result)
            }
            Err(e) => return Err(e.into()),
        };

        self.conversation
            .push(Message::user(prompt::answer_prompt(question, &sql, &result)));
        let history = self.conversation.messages().to_vec();

        let answer = match on_delta {
            Some(on_delta) => {
                let request = self.pipeline.settings().streaming_request(history, None);
                let span = self.pipeline.llm_span(OP_ANSWER, true);
                let stream = self.pipeline.provider().stream(request);
                collect_text_stream(stream, on_delta)
                    .instrument(span)
                    .await?
                    .trim()
                    .to_string()
            }
            None => self.pipeline.complete_text(history, None, OP_ANSWER).await?,
        };
        self.conversation.push(Message::assistant(answer.clone()));

        Ok(QueryAnswer {
            question: question.to_string(),
            sql,
            repair,
            result,
            answer,
        })
    }

    /// Send the whole history and append the returned SQL as an assistant turn.
    async fn next_sql(&mut self, step: &'static str) -> Result<String, PipelineError> {
        let history = self.conversation.messages().to_vec();
        let sql = self.pipeline.complete_sql(history, None, step).await?;
        self.conversation.push(Message::assistant(sql.clone()));
        Ok(sql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::box_provider::BoxLlmProvider;
    use crate::llm::request::GenerationSettings;
    use crate::testing::{MockDatabase, Reply, ScriptedProvider, sample_schema};
    use askdb_types::error::DatabaseError;
    use askdb_types::llm::{CompletionRequest, LlmError, MessageRole};
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn start(
        provider: ScriptedProvider,
        db: MockDatabase,
    ) -> (ChatSession<MockDatabase>, Arc<Mutex<Vec<CompletionRequest>>>) {
        let requests = provider.requests();
        let pipeline = QueryPipeline::new(
            BoxLlmProvider::new(provider),
            db,
            GenerationSettings::new("gemini-2.5-flash"),
        );
        (ChatSession::new(pipeline), requests)
    }

    fn count_result(n: i64) -> QueryResult {
        QueryResult::new(vec!["count".into()], vec![vec![json!(n)]])
    }

    fn roles(session: &ChatSession<MockDatabase>) -> Vec<MessageRole> {
        session
            .conversation()
            .messages()
            .iter()
            .map(|m| m.role.clone())
            .collect()
    }

    #[tokio::test]
    async fn test_turns_appended_in_order() {
        let db = MockDatabase::new(sample_schema())
            .with_result("SELECT COUNT(*) FROM users", count_result(2))
            .with_result("SELECT COUNT(*) FROM payments", count_result(5));
        let provider = ScriptedProvider::new([
            "SELECT COUNT(*) FROM users",
            "There are 2 users.",
            "SELECT COUNT(*) FROM payments",
            "There are 5 payments.",
        ]);
        let (mut session, requests) = start(provider, db);

        let first = session.ask("how many users?").await.unwrap();
        assert_eq!(first.answer, "There are 2 users.");
        let second = session.ask("and payments?").await.unwrap();
        assert_eq!(second.answer, "There are 5 payments.");

        use MessageRole::*;
        assert_eq!(
            roles(&session),
            vec![System, User, Assistant, User, Assistant, User, Assistant, User, Assistant]
        );
        let turns = session.conversation().messages();
        assert_eq!(turns[1].content, "how many users?");
        assert_eq!(turns[2].content, "SELECT COUNT(*) FROM users");
        assert!(turns[3].content.contains("[(2,)]"));
        assert_eq!(turns[8].content, "There are 5 payments.");
        assert_eq!(session.last_sql(), Some("SELECT COUNT(*) FROM payments"));

        // Each call carries the full history so far.
        let requests = requests.lock().unwrap();
        assert_eq!(requests.len(), 4);
        assert_eq!(requests[0].messages.len(), 2);
        assert_eq!(requests[1].messages.len(), 4);
        assert_eq!(requests[2].messages.len(), 6);
        assert_eq!(requests[3].messages.len(), 8);
        assert!(requests.iter().all(|r| r.system.is_none()));
        assert_eq!(requests[0].messages[0].role, MessageRole::System);
    }

    #[tokio::test]
    async fn test_system_turn_built_once_from_schema() {
        let db = MockDatabase::new(sample_schema()).with_result("SELECT 1", count_result(1));
        let introspections = db.introspections();
        let provider = ScriptedProvider::new(["SELECT 1", "one", "SELECT 1", "one"]);
        let (mut session, _) = start(provider, db);

        assert!(session.schema_text().is_none());
        session.ask("q1").await.unwrap();
        session.ask("q2").await.unwrap();

        assert_eq!(*introspections.lock().unwrap(), 1);
        assert_eq!(
            session.schema_text(),
            Some("users: id, name\npayments: id, user_id, amount")
        );
        let system = session.conversation().system_prompt().unwrap();
        assert!(system.contains("expert SQLite SQL assistant"));
    }

    #[tokio::test]
    async fn test_repair_turns_are_recorded() {
        let db = MockDatabase::new(sample_schema())
            .with_result("SELECT COUNT(*) FROM users", count_result(2));
        let provider = ScriptedProvider::new([
            "SELECT COUNT(*) FROM user",
            "SELECT COUNT(*) FROM users",
            "There are 2 users.",
        ]);
        let (mut session, requests) = start(provider, db);

        let answer = session.ask("how many users?").await.unwrap();
        assert!(answer.was_repaired());
        assert_eq!(answer.sql, "SELECT COUNT(*) FROM users");

        use MessageRole::*;
        assert_eq!(
            roles(&session),
            vec![System, User, Assistant, User, Assistant, User, Assistant]
        );
        let turns = session.conversation().messages();
        assert!(turns[3].content.contains("The query:\nSELECT COUNT(*) FROM user\n"));
        assert!(turns[3].content.contains("syntax error"));
        assert_eq!(turns[4].content, "SELECT COUNT(*) FROM users");
        assert_eq!(requests.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_failed_exchange_rolls_back_history() {
        let db = MockDatabase::new(sample_schema())
            .with_result("SELECT COUNT(*) FROM users", count_result(2));
        let provider = ScriptedProvider::with_replies([
            Reply::Text("SELECT COUNT(*) FROM users".into()),
            Reply::Text("There are 2 users.".into()),
            Reply::Text("SELEC broken".into()),
            Reply::Text("SELEC still broken".into()),
            Reply::Text("SELECT COUNT(*) FROM users".into()),
            Reply::Fail("quota exceeded".into()),
        ]);
        let (mut session, _) = start(provider, db);

        session.ask("how many users?").await.unwrap();
        assert_eq!(session.conversation().len(), 5);

        let err = session.ask("bad question").await.unwrap_err();
        assert!(matches!(err, PipelineError::Database(_)));
        assert_eq!(session.conversation().len(), 5);

        let err = session.ask("another").await.unwrap_err();
        assert!(matches!(err, PipelineError::Llm(LlmError::Provider { .. })));
        assert_eq!(session.conversation().len(), 5);
        assert_eq!(session.last_sql(), Some("SELECT COUNT(*) FROM users"));
    }

    #[tokio::test]
    async fn test_connection_error_skips_repair_and_rolls_back() {
        let db = MockDatabase::new(sample_schema())
            .with_connection_error("SELECT COUNT(*) FROM users", "server closed the connection");
        let executed = db.executed();
        let provider = ScriptedProvider::new(["SELECT COUNT(*) FROM users", "never used"]);
        let (mut session, requests) = start(provider, db);

        let err = session.ask("how many users?").await.unwrap_err();
        assert!(matches!(err, PipelineError::Database(DatabaseError::Connection(_))));
        assert_eq!(requests.lock().unwrap().len(), 1);
        assert_eq!(executed.lock().unwrap().len(), 1);
        assert_eq!(roles(&session), vec![MessageRole::System]);
        assert_eq!(session.last_sql(), None);
    }

    #[tokio::test]
    async fn test_ask_streaming_appends_full_answer() {
        let db = MockDatabase::new(sample_schema())
            .with_result("SELECT COUNT(*) FROM users", count_result(2));
        let provider = ScriptedProvider::new(["SELECT COUNT(*) FROM users", "There are 2 users."]);
        let (mut session, requests) = start(provider, db);

        let mut deltas = Vec::new();
        let answer = session
            .ask_streaming("how many users?", |d| deltas.push(d.to_string()))
            .await
            .unwrap();

        assert_eq!(deltas.concat(), "There are 2 users.");
        assert!(deltas.len() > 1);
        assert_eq!(answer.answer, "There are 2 users.");
        let last = session.conversation().messages().last().unwrap();
        assert_eq!(last.role, MessageRole::Assistant);
        assert_eq!(last.content, "There are 2 users.");
        assert!(requests.lock().unwrap()[1].stream);
    }

    #[tokio::test]
    async fn test_reset_keeps_system_and_clears_last_sql() {
        let db = MockDatabase::new(sample_schema()).with_result("SELECT 1", count_result(1));
        let (mut session, _) = start(ScriptedProvider::new(["SELECT 1", "one"]), db);
        session.ask("q").await.unwrap();
        session.reset();
        assert_eq!(session.conversation().len(), 1);
        assert!(session.conversation().has_system());
        assert!(session.last_sql().is_none());
    }

    #[tokio::test]
    async fn test_blank_question_adds_no_turns() {
        let db = MockDatabase::new(sample_schema());
        let (mut session, requests) = start(ScriptedProvider::new(["SELECT 1"]), db);
        let err = session.ask("\n").await.unwrap_err();
        assert!(matches!(err, PipelineError::EmptyQuestion));
        assert!(session.conversation().is_empty());
        assert!(requests.lock().unwrap().is_empty());
    }
}
