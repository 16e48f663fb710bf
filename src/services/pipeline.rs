use std::sync::Arc;
use std::time::Instant;

use crate::error::AppError;
use crate::models::{PipelineStage, QueryRun, ResultView};
use crate::services::database::DatabaseAdapter;
use crate::services::extraction;
use crate::services::result_parser;
use crate::services::speech::SpeechSynthesizer;
use crate::services::summarizer::Summarizer;
use crate::services::translator::SqlTranslator;

/// Question in, answer out: translate, extract, execute, parse,
/// summarize and optionally speak.
///
/// Each stage runs at most once. Translation, extraction and execution
/// failures end the request; parse, summary and speech failures leave a
/// notice on the run and keep whatever was already produced.
pub struct QueryPipeline {
    translator: Arc<dyn SqlTranslator>,
    database: Arc<dyn DatabaseAdapter>,
    summarizer: Arc<dyn Summarizer>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
}

impl QueryPipeline {
    pub fn new(
        translator: Arc<dyn SqlTranslator>,
        database: Arc<dyn DatabaseAdapter>,
        summarizer: Arc<dyn Summarizer>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
    ) -> Self {
        Self {
            translator,
            database,
            summarizer,
            synthesizer,
        }
    }

    /// Run one question through every stage. Never fails: errors end up
    /// on the returned run.
    pub async fn answer(&self, question: &str, voice_enabled: bool) -> QueryRun {
        let mut run = QueryRun::new(question);
        tracing::info!(run_id = %run.id, voice_enabled, "Processing question: {}", question);

        match self.run_stages(&mut run, voice_enabled).await {
            Ok(()) => run.mark_done(),
            Err(e) => run.mark_failed(e),
        }
        run
    }

    async fn run_stages(&self, run: &mut QueryRun, voice_enabled: bool) -> Result<(), AppError> {
        run.advance(PipelineStage::Translating);
        let schema = self
            .database
            .table_info()
            .await
            .map_err(|e| AppError::Translation(format!("Failed to read database schema: {}", e)))?;
        let translation = self.translator.translate(&run.question, &schema).await?;
        run.generated_text = Some(translation.text.clone());

        run.advance(PipelineStage::Extracting);
        let sql = extraction::extract(&translation.text)?;
        tracing::info!(run_id = %run.id, "Extracted SQL: {}", sql.as_str());
        run.sql = Some(sql.as_str().to_string());

        run.advance(PipelineStage::Executing);
        let start_time = Instant::now();
        let raw = self.database.execute_query(sql.as_str()).await?;
        run.execution_time_ms = Some(start_time.elapsed().as_millis() as u64);

        run.advance(PipelineStage::Parsing);
        let results = match result_parser::parse(&raw) {
            Ok(results) => results,
            Err(e) => {
                run.results = ResultView::Unparsed(raw.to_string());
                run.add_notice(e);
                return Ok(());
            }
        };

        run.mark_results(results.clone());
        if results.is_empty() {
            tracing::info!(run_id = %run.id, "No results found");
            return Ok(());
        }

        run.advance(PipelineStage::Summarizing);
        let summary = match self.summarizer.summarize(&run.question, &results).await {
            Ok(summary) => summary,
            Err(e) => {
                run.add_notice(e);
                return Ok(());
            }
        };
        run.summary = Some(summary.clone());

        if voice_enabled {
            run.advance(PipelineStage::Synthesizing);
            match self.synthesizer.speak(&summary).await {
                Ok(audio) => run.audio = Some(audio),
                Err(e) => run.add_notice(e),
            }
        }

        Ok(())
    }
}
