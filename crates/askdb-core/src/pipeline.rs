//! QueryPipeline: question -> SQL -> rows -> answer, with one-shot repair.
//!
//! Each run is strictly sequential: schema context, SQL generation,
//! execution (plus at most one regeneration when the statement fails),
//! then answer phrasing. LLM failures are never repaired.

use tracing::{Instrument, debug, info, info_span, warn};

use askdb_types::error::PipelineError;
use askdb_types::llm::{LlmError, Message};
use askdb_types::query::{QueryAnswer, QueryResult, RepairAttempt};

use crate::database::SqlDatabase;
use crate::llm::box_provider::BoxLlmProvider;
use crate::llm::request::{GenerationSettings, collect_text_stream};
use crate::prompt;
use crate::retrieval::index::SchemaIndex;

/// `gen_ai.operation.name` of each LLM call a question makes.
pub const OP_GENERATE_SQL: &str = "generate_sql";
pub const OP_REPAIR_SQL: &str = "repair_sql";
pub const OP_ANSWER: &str = "answer";

/// The executed statement and its rows, before the answer is phrased.
#[derive(Debug, Clone)]
pub struct ResolvedQuery {
    pub sql: String,
    pub repair: Option<RepairAttempt>,
    pub result: QueryResult,
}

/// Stateless single-question pipeline. Safe to share across tasks.
pub struct QueryPipeline<D> {
    provider: BoxLlmProvider,
    database: D,
    index: Option<SchemaIndex>,
    settings: GenerationSettings,
}

impl<D: SqlDatabase> QueryPipeline<D> {
    pub fn new(provider: BoxLlmProvider, database: D, settings: GenerationSettings) -> Self {
        Self {
            provider,
            database,
            index: None,
            settings,
        }
    }

    /// Use retrieved schema chunks instead of the full compact schema.
    pub fn with_index(mut self, index: SchemaIndex) -> Self {
        self.index = Some(index);
        self
    }

    pub fn provider(&self) -> &BoxLlmProvider {
        &self.provider
    }

    pub fn database(&self) -> &D {
        &self.database
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    pub fn index(&self) -> Option<&SchemaIndex> {
        self.index.as_ref()
    }

    pub fn dialect(&self) -> &str {
        self.database.dialect()
    }

    /// Build the schema index, if one is configured. Returns the chunk count.
    pub async fn prepare(&self) -> Result<Option<usize>, PipelineError> {
        let Some(index) = &self.index else {
            return Ok(None);
        };
        let schema = self.database.introspect().await?;
        Ok(Some(index.build(&schema).await?))
    }

    /// Schema text for prompting about `question`.
    ///
    /// A fresh compact introspection, or the retrieved chunks when an index
    /// is configured.
    pub async fn schema_context(&self, question: &str) -> Result<String, PipelineError> {
        match &self.index {
            Some(index) => Ok(index.retrieve(question, index.top_k()).await?),
            None => Ok(self.database.introspect().await?.compact_text()),
        }
    }

    /// Answer `question` end to end.
    pub async fn run(&self, question: &str) -> Result<QueryAnswer, PipelineError> {
        let question = validate_question(question)?;
        let resolved = self.resolve(question).await?;

        let answer_prompt = prompt::answer_prompt(question, &resolved.sql, &resolved.result);
        let answer = self
            .complete_text(vec![Message::user(answer_prompt)], None, OP_ANSWER)
            .await?;

        Ok(finish(question, resolved, answer))
    }

    /// Like [`QueryPipeline::run`], but streams the answer text to `on_delta`.
    pub async fn run_streaming<F>(
        &self,
        question: &str,
        on_delta: F,
    ) -> Result<QueryAnswer, PipelineError>
    where
        F: FnMut(&str),
    {
        let question = validate_question(question)?;
        let resolved = self.resolve(question).await?;

        let answer_prompt = prompt::answer_prompt(question, &resolved.sql, &resolved.result);
        let request = self
            .settings
            .streaming_request(vec![Message::user(answer_prompt)], None);
        let span = self.llm_span(OP_ANSWER, true);
        let answer = collect_text_stream(self.provider.stream(request), on_delta)
            .instrument(span)
            .await?;

        Ok(finish(question, resolved, answer.trim().to_string()))
    }

    /// Generate and execute SQL for `question`, repairing once on failure.
    pub async fn resolve(&self, question: &str) -> Result<ResolvedQuery, PipelineError> {
        let schema_text = self.schema_context(question).await?;
        let dialect = self.database.dialect();

        let sql = self
            .complete_sql(
                vec![Message::user(question)],
                Some(prompt::sql_system_prompt(dialect, &schema_text)),
                OP_GENERATE_SQL,
            )
            .await?;
        info!(sql = %sql, "first sql");

        let first = self.database.execute(&sql).await;
        let error = match first {
            Ok(result) => {
                debug!(rows = result.row_count(), "query executed");
                return Ok(ResolvedQuery {
                    sql,
                    repair: None,
                    result,
                });
            }
            Err(e) if e.is_execution() => e,
            Err(e) => return Err(e.into()),
        };

        warn!(error = %error, "generated sql failed, asking for a corrected query");
        let original = prompt::sql_request_prompt(dialect, &schema_text, question);
        let repair_prompt = prompt::repair_prompt(&original, &sql, &error.to_string());
        let updated_sql = self
            .complete_sql(vec![Message::user(repair_prompt)], None, OP_REPAIR_SQL)
            .await?;
        info!(sql = %updated_sql, "updated sql");

        let result = self.database.execute(&updated_sql).await?;
        Ok(ResolvedQuery {
            sql: updated_sql,
            repair: Some(RepairAttempt {
                failed_sql: sql,
                error: error.to_string(),
            }),
            result,
        })
    }

    pub(crate) async fn complete_sql(
        &self,
        messages: Vec<Message>,
        system: Option<String>,
        step: &'static str,
    ) -> Result<String, PipelineError> {
        let text = self.complete_text(messages, system, step).await?;
        if text.is_empty() {
            return Err(PipelineError::EmptySql);
        }
        Ok(text)
    }

    /// One non-streaming completion, trimmed.
    pub(crate) async fn complete_text(
        &self,
        messages: Vec<Message>,
        system: Option<String>,
        step: &'static str,
    ) -> Result<String, LlmError> {
        let request = self.settings.request(messages, system);
        let span = self.llm_span(step, false);
        let response = self.provider.complete(&request).instrument(span).await?;
        Ok(prompt::clean_sql(&response.content).to_string())
    }

    pub(crate) fn llm_span(&self, step: &'static str, stream: bool) -> tracing::Span {
        info_span!(
            "gen_ai.chat",
            gen_ai.operation.name = step,
            gen_ai.system = self.provider.name(),
            gen_ai.request.model = %self.settings.model,
            gen_ai.request.max_tokens = self.settings.max_tokens,
            gen_ai.request.temperature = ?self.settings.temperature,
            gen_ai.request.stream = stream,
        )
    }
}

fn validate_question(question: &str) -> Result<&str, PipelineError> {
    let trimmed = question.trim();
    if trimmed.is_empty() {
        return Err(PipelineError::EmptyQuestion);
    }
    Ok(trimmed)
}

fn finish(question: &str, resolved: ResolvedQuery, answer: String) -> QueryAnswer {
    QueryAnswer {
        question: question.to_string(),
        sql: resolved.sql,
        repair: resolved.repair,
        result: resolved.result,
        answer,
    }
}
