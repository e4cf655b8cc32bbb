//! In-memory doubles for the port traits, shared by the unit tests.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::{Arc, Mutex};

use askdb_types::error::{DatabaseError, RetrievalError};
use askdb_types::llm::{
    CompletionRequest, CompletionResponse, LlmError, ProviderCapabilities, StopReason,
    StreamEvent, Usage,
};
use askdb_types::query::QueryResult;
use askdb_types::schema::{ColumnInfo, DatabaseSchema, ForeignKey, IndexInfo, TableSchema};

use crate::database::SqlDatabase;
use crate::llm::provider::{EventStream, LlmProvider};
use crate::retrieval::chunker::TextChunker;
use crate::retrieval::embedder::Embedder;
use crate::retrieval::store::{ChunkMatch, SchemaVectorStore};

/// A canned provider reply.
#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    Fail(String),
}

/// Provider that answers from a fixed script and records every request.
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Reply>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
    capabilities: ProviderCapabilities,
}

impl ScriptedProvider {
    pub fn new<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_replies(texts.into_iter().map(|t| Reply::Text(t.into())))
    }

    pub fn with_replies(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            requests: Arc::new(Mutex::new(Vec::new())),
            capabilities: ProviderCapabilities {
                streaming: true,
                max_context_tokens: 1_000_000,
                max_output_tokens: 8_192,
            },
        }
    }

    /// Handle to the recorded requests; stays valid after the provider is boxed.
    pub fn requests(&self) -> Arc<Mutex<Vec<CompletionRequest>>> {
        Arc::clone(&self.requests)
    }

    fn next_reply(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        match self.replies.lock().unwrap().pop_front() {
            Some(Reply::Text(text)) => Ok(text),
            Some(Reply::Fail(message)) => Err(LlmError::Provider { message }),
            None => Err(LlmError::EmptyResponse),
        }
    }
}

impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn capabilities(&self) -> &ProviderCapabilities {
        &self.capabilities
    }

    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl Future<Output = Result<CompletionResponse, LlmError>> + Send {
        let reply = self.next_reply(request);
        let model = request.model.clone();
        async move {
            let content = reply?;
            Ok(CompletionResponse {
                id: "resp-scripted".to_string(),
                content,
                model,
                stop_reason: StopReason::EndTurn,
                usage: Usage::default(),
            })
        }
    }

    fn stream(&self, request: CompletionRequest) -> EventStream {
        let reply = self.next_reply(&request);
        Box::pin(async_stream::stream! {
            match reply {
                Ok(text) => {
                    yield Ok(StreamEvent::Connected);
                    for piece in text.split_inclusive(' ') {
                        yield Ok(StreamEvent::TextDelta { text: piece.to_string() });
                    }
                    yield Ok(StreamEvent::Done);
                }
                Err(e) => yield Err(e),
            }
        })
    }
}

/// Database whose statements resolve from a lookup table.
///
/// Unknown statements fail with an execution error.
pub struct MockDatabase {
    schema: DatabaseSchema,
    results: HashMap<String, QueryResult>,
    unreachable: HashMap<String, String>,
    executed: Arc<Mutex<Vec<String>>>,
    introspections: Arc<Mutex<usize>>,
}

impl MockDatabase {
    pub fn new(schema: DatabaseSchema) -> Self {
        Self {
            schema,
            results: HashMap::new(),
            unreachable: HashMap::new(),
            executed: Arc::new(Mutex::new(Vec::new())),
            introspections: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_result(mut self, sql: &str, result: QueryResult) -> Self {
        self.results.insert(sql.to_string(), result);
        self
    }

    /// Running `sql` fails as if the server went away.
    pub fn with_connection_error(mut self, sql: &str, message: &str) -> Self {
        self.unreachable.insert(sql.to_string(), message.to_string());
        self
    }

    pub fn executed(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.executed)
    }

    pub fn introspections(&self) -> Arc<Mutex<usize>> {
        Arc::clone(&self.introspections)
    }
}

impl SqlDatabase for MockDatabase {
    fn dialect(&self) -> &str {
        "SQLite"
    }

    fn introspect(&self) -> impl Future<Output = Result<DatabaseSchema, DatabaseError>> + Send {
        *self.introspections.lock().unwrap() += 1;
        let schema = self.schema.clone();
        async move { Ok(schema) }
    }

    fn execute(
        &self,
        sql: &str,
    ) -> impl Future<Output = Result<QueryResult, DatabaseError>> + Send {
        self.executed.lock().unwrap().push(sql.to_string());
        let outcome = match self.unreachable.get(sql) {
            Some(message) => Err(DatabaseError::Connection(message.clone())),
            None => self
                .results
                .get(sql)
                .cloned()
                .ok_or_else(|| DatabaseError::Execution(format!("near \"{sql}\": syntax error"))),
        };
        async move { outcome }
    }
}

/// Embeds text as keyword occurrence counts.
pub struct KeywordEmbedder {
    keywords: Vec<String>,
}

impl KeywordEmbedder {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keywords: keywords.into_iter().map(Into::into).collect(),
        }
    }
}

impl Embedder for KeywordEmbedder {
    fn embed(
        &self,
        texts: &[String],
    ) -> impl Future<Output = Result<Vec<Vec<f32>>, RetrievalError>> + Send {
        let vectors: Vec<Vec<f32>> = texts
            .iter()
            .map(|t| {
                let lower = t.to_lowercase();
                self.keywords
                    .iter()
                    .map(|k| lower.matches(k.as_str()).count() as f32)
                    .collect::<Vec<f32>>()
            })
            .collect();
        async move { Ok(vectors) }
    }

    fn model_name(&self) -> &str {
        "keyword"
    }

    fn dimension(&self) -> usize {
        self.keywords.len()
    }
}

/// Brute-force cosine store.
#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<(String, Vec<f32>)>>,
}

fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        1.0
    } else {
        1.0 - dot / (na * nb)
    }
}

impl SchemaVectorStore for MemoryStore {
    fn replace(
        &self,
        chunks: &[String],
        embeddings: &[Vec<f32>],
    ) -> impl Future<Output = Result<usize, RetrievalError>> + Send {
        let mut rows = self.rows.lock().unwrap();
        *rows = chunks.iter().cloned().zip(embeddings.iter().cloned()).collect();
        let n = rows.len();
        async move { Ok(n) }
    }

    fn search(
        &self,
        embedding: &[f32],
        limit: usize,
    ) -> impl Future<Output = Result<Vec<ChunkMatch>, RetrievalError>> + Send {
        let mut matches: Vec<ChunkMatch> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .map(|(text, v)| ChunkMatch {
                text: text.clone(),
                distance: cosine_distance(embedding, v),
            })
            .collect();
        matches.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        matches.truncate(limit);
        async move { Ok(matches) }
    }

    fn count(&self) -> impl Future<Output = Result<usize, RetrievalError>> + Send {
        let n = self.rows.lock().unwrap().len();
        async move { Ok(n) }
    }
}

/// One chunk per `Table:` block.
pub struct TableChunker;

impl TextChunker for TableChunker {
    fn chunk(&self, text: &str) -> Result<Vec<String>, RetrievalError> {
        Ok(text
            .split("Table: ")
            .filter(|block| !block.trim().is_empty())
            .map(|block| format!("Table: {}", block.trim_end()))
            .collect())
    }
}

fn column(name: &str, ty: &str, nullable: bool) -> ColumnInfo {
    ColumnInfo {
        name: name.to_string(),
        data_type: ty.to_string(),
        nullable,
        default: None,
    }
}

/// `users(id, name)` and `payments(id, user_id, amount)` with a foreign key.
pub fn sample_schema() -> DatabaseSchema {
    let mut users = TableSchema::new("users");
    users.columns = vec![column("id", "INTEGER", false), column("name", "TEXT", true)];
    users.primary_keys = vec!["id".to_string()];

    let mut payments = TableSchema::new("payments");
    payments.columns = vec![
        column("id", "INTEGER", false),
        column("user_id", "INTEGER", false),
        column("amount", "REAL", false),
    ];
    payments.primary_keys = vec!["id".to_string()];
    payments.foreign_keys = vec![ForeignKey {
        columns: vec!["user_id".to_string()],
        referred_table: "users".to_string(),
        referred_columns: vec!["id".to_string()],
    }];
    payments.indexes = vec![IndexInfo {
        name: "idx_payments_user".to_string(),
        columns: vec!["user_id".to_string()],
        unique: false,
    }];

    DatabaseSchema::new(vec![users, payments])
}
