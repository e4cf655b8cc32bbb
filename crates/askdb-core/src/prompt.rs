//! Prompt templates for SQL generation, repair and answer phrasing.
//!
//! Every function here is pure string formatting; the pipeline and chat
//! session decide which messages carry which prompt.

use askdb_types::query::QueryResult;

/// System prompt for SQL generation: output rules, examples and the schema.
pub fn sql_system_prompt(dialect: &str, schema_text: &str) -> String {
    format!(
        "You are an expert {dialect} SQL assistant. The database you are working on is {dialect}.\n\
         Use only the provided database schema to answer queries.\n\
         STRICT OUTPUT RULES:\n\
         - Output ONLY raw SQL text.\n\
         - Do not wrap the SQL in markdown.\n\
         - Always return a valid {dialect} SQL statement.\n\
         - Do not add a trailing semicolon.\n\
         \n\
         Example of correct output:\n\
         \x20   SELECT * FROM users\n\
         \n\
         Example of wrong output:\n\
         \x20   ```sql\n\
         \x20   SELECT * FROM users;\n\
         \x20   ```\n\
         \n\
         Below is the {dialect} schema:\n\
         {schema_text}\n"
    )
}

/// Single-message variant of the SQL prompt carrying the question inline.
///
/// This is also the "original prompt" quoted back to the model on repair.
pub fn sql_request_prompt(dialect: &str, schema_text: &str, question: &str) -> String {
    format!(
        "You are an expert {dialect} SQL assistant. The database you are working on is {dialect}.\n\
         \n\
         Schema:\n\
         {schema_text}\n\
         \n\
         User question: {question}\n\
         \n\
         Return only the {dialect} SQL query without the semicolon. Don't wrap the query in markdown.\n"
    )
}

/// Ask for a corrected statement after `failed_sql` raised `error`.
pub fn repair_prompt(original_prompt: &str, failed_sql: &str, error: &str) -> String {
    format!(
        "You are an expert DBA. Based on the prompt, you provided a SQL query. That query ran into an error.\n\
         Based on the error, provide an updated query.\n\
         \n\
         -- Prompt starts here\n\
         The prompt:\n\
         {original_prompt}\n\
         -- Prompt ends here\n\
         \n\
         -- Query starts here\n\
         The query:\n\
         {failed_sql}\n\
         -- Query ends here\n\
         \n\
         -- The error starts here\n\
         The error: {error}\n\
         -- The error ends here\n\
         \n\
         Return only the corrected SQL query. Make sure to not include any explanations.\n"
    )
}

/// Ask the model to phrase `result` as an answer to `question`.
///
/// The result is interpolated through its `Display` impl, unmodified.
pub fn answer_prompt(question: &str, sql: &str, result: &QueryResult) -> String {
    format!(
        "You are a helpful assistant.\n\
         Your task is to process the user query and provide them a response.\n\
         A user has asked you this question: {question}\n\
         DBA executed this SQL query: {sql}\n\
         This is the result from the database: {result}\n\
         Create a well structured response for the user. \
         Don't add any context or salutation. Return a plain text response that is user focused.\n"
    )
}

/// Normalize model output before execution: surrounding whitespace only.
pub fn clean_sql(text: &str) -> &str {
    text.trim()
}
