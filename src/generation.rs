//! Batch generation and single-image edits.
//!
//! A batch issues `count` calls one after another with the same prompt and
//! aspect ratio. Each outcome is handed to the caller as soon as it arrives,
//! so a batch that fails halfway still yields what succeeded. Failures never
//! abort the batch.
//!
//! ## Notifications
//!
//! | Outcome                              | Toasts                          |
//! |--------------------------------------|---------------------------------|
//! | each safety block                    | one warning                     |
//! | ≥ 1 success                          | one success with the count      |
//! | 0 successes, ≥ 1 generic failure     | one error                       |
//! | 0 successes, only safety blocks      | nothing beyond the warnings     |

use crate::credentials::ApiKey;
use crate::geometry::AspectRatio;
use crate::notify::Severity;
use crate::prompt::{build_prompt, edit_instruction};
use crate::service::{GenerationRequest, ImageService, ServiceError};
use crate::types::{ArtifactId, GenerationConfig, IdSequence};
use chrono::{DateTime, Utc};
use std::sync::mpsc::Sender;
use thiserror::Error;

/// Most images a single batch may request.
pub const MAX_BATCH: u32 = 3;

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Blocked by the safety filter; try a different topic or theme")]
    SafetyBlocked { reason: Option<String> },
    #[error("Generation failed: {0}")]
    Failed(#[source] ServiceError),
    #[error("Batch size must be 1-3, got {0}")]
    InvalidCount(u32),
}

impl From<ServiceError> for GenerationError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::SafetyBlocked { reason } => GenerationError::SafetyBlocked { reason },
            other => GenerationError::Failed(other),
        }
    }
}

impl GenerationError {
    pub fn is_safety_block(&self) -> bool {
        matches!(self, GenerationError::SafetyBlocked { .. })
    }
}

/// One successfully generated image with the settings that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedArtifact {
    pub id: ArtifactId,
    pub image: Vec<u8>,
    pub config: GenerationConfig,
    pub created_at: DateTime<Utc>,
}

/// Progress events, sent while a batch runs.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationEvent {
    BatchStarted {
        total: u32,
        aspect: AspectRatio,
        summary: String,
    },
    Attempt {
        current: u32,
        total: u32,
    },
    ItemReady {
        current: u32,
        total: u32,
        id: ArtifactId,
        bytes: usize,
    },
    ItemFailed {
        current: u32,
        total: u32,
        safety_blocked: bool,
        message: String,
    },
}

/// Tally of one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub requested: u32,
    pub succeeded: u32,
    pub safety_blocked: u32,
    pub failed: u32,
}

impl BatchSummary {
    pub fn failures(&self) -> u32 {
        self.safety_blocked + self.failed
    }

    /// The single end-of-batch notification, if one is due.
    pub fn aggregate_toast(&self) -> Option<(Severity, String)> {
        if self.succeeded > 0 {
            let noun = if self.succeeded == 1 { "page" } else { "pages" };
            let text = match self.failures() {
                0 => format!("Generated {} coloring {noun}", self.succeeded),
                n => format!(
                    "Generated {} coloring {noun} ({n} of {} failed)",
                    self.succeeded, self.requested
                ),
            };
            Some((Severity::Success, text))
        } else if self.failed > 0 {
            Some((
                Severity::Error,
                format!(
                    "Image generation failed ({} of {} attempts)",
                    self.failed, self.requested
                ),
            ))
        } else {
            None
        }
    }
}

fn send(progress: Option<&Sender<GenerationEvent>>, event: GenerationEvent) {
    if let Some(tx) = progress {
        // A dropped receiver only means nobody is printing progress.
        let _ = tx.send(event);
    }
}

/// Run a sequential batch of `count` generations for `config`.
///
/// `on_result` is called once per attempt, in order, before the next call
/// starts. Successful items get a fresh id from `ids`.
pub fn run_batch(
    service: &impl ImageService,
    key: &ApiKey,
    config: &GenerationConfig,
    count: u32,
    ids: &mut IdSequence,
    progress: Option<&Sender<GenerationEvent>>,
    mut on_result: impl FnMut(Result<GeneratedArtifact, GenerationError>),
) -> Result<BatchSummary, GenerationError> {
    if !(1..=MAX_BATCH).contains(&count) {
        return Err(GenerationError::InvalidCount(count));
    }

    let prompt = build_prompt(config);
    let aspect = config.layout().aspect_ratio();
    let request = GenerationRequest {
        prompt: &prompt,
        aspect,
    };

    tracing::info!(count, aspect = %aspect, subject = %config.summary(), "batch started");
    send(
        progress,
        GenerationEvent::BatchStarted {
            total: count,
            aspect,
            summary: config.summary(),
        },
    );

    let mut summary = BatchSummary {
        requested: count,
        ..BatchSummary::default()
    };

    for current in 1..=count {
        send(progress, GenerationEvent::Attempt { current, total: count });

        match service.generate(key, &request) {
            Ok(image) => {
                let artifact = GeneratedArtifact {
                    id: ArtifactId(ids.next_id()),
                    image,
                    config: config.clone(),
                    created_at: Utc::now(),
                };
                summary.succeeded += 1;
                tracing::debug!(current, id = %artifact.id, "batch item ready");
                send(
                    progress,
                    GenerationEvent::ItemReady {
                        current,
                        total: count,
                        id: artifact.id,
                        bytes: artifact.image.len(),
                    },
                );
                on_result(Ok(artifact));
            }
            Err(err) => {
                let err = GenerationError::from(err);
                if err.is_safety_block() {
                    summary.safety_blocked += 1;
                } else {
                    summary.failed += 1;
                }
                tracing::warn!(current, error = %err, "batch item failed");
                send(
                    progress,
                    GenerationEvent::ItemFailed {
                        current,
                        total: count,
                        safety_blocked: err.is_safety_block(),
                        message: err.to_string(),
                    },
                );
                on_result(Err(err));
            }
        }
    }

    tracing::info!(
        succeeded = summary.succeeded,
        failed = summary.failures(),
        "batch finished"
    );
    Ok(summary)
}

/// Apply one edit operation to `image`. Unknown operation ids fall back to a
/// generic refinement instruction.
pub fn edit_image(
    service: &impl ImageService,
    key: &ApiKey,
    image: &[u8],
    operation_id: &str,
) -> Result<Vec<u8>, GenerationError> {
    let instruction = edit_instruction(operation_id);
    tracing::info!(operation = operation_id, "edit requested");
    Ok(service.edit(key, image, instruction)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::{EditOperation, FALLBACK_EDIT_INSTRUCTION};
    use crate::service::tests::{MockService, RecordedCall, generic_failure, safety_block};
    use crate::types::MandalaTheme;
    use std::sync::mpsc;

    fn key() -> ApiKey {
        ApiKey::new("test-key-0000-0000").unwrap()
    }

    fn collect_batch(
        service: &MockService,
        count: u32,
    ) -> (BatchSummary, Vec<Result<GeneratedArtifact, GenerationError>>) {
        let mut ids = IdSequence::new();
        let mut results = Vec::new();
        let summary = run_batch(
            service,
            &key(),
            &GenerationConfig::free("owls"),
            count,
            &mut ids,
            None,
            |r| results.push(r),
        )
        .unwrap();
        (summary, results)
    }

    // =========================================================================
    // Batches
    // =========================================================================

    #[test]
    fn safety_block_mid_batch_keeps_going() {
        let service =
            MockService::with_generate(vec![Ok(vec![1]), Err(safety_block()), Ok(vec![3])]);
        let (summary, results) = collect_batch(&service, 3);

        assert_eq!(results.len(), 3);
        assert!(results[1].as_ref().unwrap_err().is_safety_block());
        let images: Vec<Vec<u8>> = results
            .into_iter()
            .filter_map(Result::ok)
            .map(|a| a.image)
            .collect();
        assert_eq!(images, vec![vec![1], vec![3]]);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.safety_blocked, 1);

        let (severity, text) = summary.aggregate_toast().unwrap();
        assert_eq!(severity, Severity::Success);
        assert!(text.contains('2'));
    }

    #[test]
    fn every_call_uses_same_prompt_and_ratio() {
        let service = MockService::with_generate(vec![Ok(vec![1]), Ok(vec![2])]);
        collect_batch(&service, 2);
        let calls = service.get_calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], calls[1]);
        match &calls[0] {
            RecordedCall::Generate { prompt, aspect } => {
                // Default layout: 2x2 A4 portrait
                assert_eq!(aspect, "210:297");
                assert!(prompt.contains("210:297"));
                assert!(prompt.contains("owls"));
            }
            other => panic!("unexpected call {other:?}"),
        }
    }

    #[test]
    fn ids_are_fresh_per_success() {
        let service = MockService::with_generate(vec![Ok(vec![1]), Ok(vec![2]), Ok(vec![3])]);
        let (_, results) = collect_batch(&service, 3);
        let ids: Vec<ArtifactId> = results.into_iter().map(|r| r.unwrap().id).collect();
        assert_eq!(ids, vec![ArtifactId(1), ArtifactId(2), ArtifactId(3)]);
    }

    #[test]
    fn all_generic_failures_give_one_error_toast() {
        let service = MockService::with_generate(vec![
            Err(generic_failure()),
            Err(generic_failure()),
        ]);
        let (summary, _) = collect_batch(&service, 2);
        assert_eq!(summary.failed, 2);
        let (severity, _) = summary.aggregate_toast().unwrap();
        assert_eq!(severity, Severity::Error);
    }

    #[test]
    fn only_safety_blocks_give_no_aggregate_toast() {
        let service = MockService::with_generate(vec![Err(safety_block())]);
        let (summary, _) = collect_batch(&service, 1);
        assert_eq!(summary.safety_blocked, 1);
        assert!(summary.aggregate_toast().is_none());
    }

    #[test]
    fn success_toast_mentions_failures() {
        let summary = BatchSummary {
            requested: 3,
            succeeded: 1,
            safety_blocked: 1,
            failed: 1,
        };
        let (_, text) = summary.aggregate_toast().unwrap();
        assert_eq!(text, "Generated 1 coloring page (2 of 3 failed)");
    }

    #[test]
    fn count_outside_range_is_rejected() {
        let service = MockService::new();
        let mut ids = IdSequence::new();
        for count in [0, MAX_BATCH + 1] {
            let err = run_batch(
                &service,
                &key(),
                &GenerationConfig::mandala(MandalaTheme::Ocean),
                count,
                &mut ids,
                None,
                |_| {},
            )
            .unwrap_err();
            assert!(matches!(err, GenerationError::InvalidCount(c) if c == count));
        }
        assert!(service.get_calls().is_empty());
    }

    #[test]
    fn progress_events_in_order() {
        let service = MockService::with_generate(vec![Ok(vec![9]), Err(safety_block())]);
        let (tx, rx) = mpsc::channel();
        let mut ids = IdSequence::new();
        run_batch(
            &service,
            &key(),
            &GenerationConfig::free("cats"),
            2,
            &mut ids,
            Some(&tx),
            |_| {},
        )
        .unwrap();
        drop(tx);

        let events: Vec<GenerationEvent> = rx.iter().collect();
        assert_eq!(events.len(), 5);
        assert!(matches!(events[0], GenerationEvent::BatchStarted { total: 2, .. }));
        assert_eq!(events[1], GenerationEvent::Attempt { current: 1, total: 2 });
        assert!(matches!(
            events[2],
            GenerationEvent::ItemReady { current: 1, id: ArtifactId(1), bytes: 1, .. }
        ));
        assert_eq!(events[3], GenerationEvent::Attempt { current: 2, total: 2 });
        assert!(matches!(
            events[4],
            GenerationEvent::ItemFailed { current: 2, safety_blocked: true, .. }
        ));
    }

    // =========================================================================
    // Edits
    // =========================================================================

    #[test]
    fn edit_sends_operation_instruction() {
        let service = MockService::with_edit(vec![Ok(vec![7, 7])]);
        let out = edit_image(&service, &key(), &[1, 2], "simplify").unwrap();
        assert_eq!(out, vec![7, 7]);
        assert_eq!(
            service.get_calls(),
            vec![RecordedCall::Edit {
                image: vec![1, 2],
                instruction: EditOperation::Simplify.instruction().to_string(),
            }]
        );
    }

    #[test]
    fn edit_with_unknown_operation_uses_fallback() {
        let service = MockService::with_edit(vec![Ok(vec![1])]);
        edit_image(&service, &key(), &[0], "make-it-pop").unwrap();
        match &service.get_calls()[0] {
            RecordedCall::Edit { instruction, .. } => {
                assert_eq!(instruction, FALLBACK_EDIT_INSTRUCTION)
            }
            other => panic!("unexpected call {other:?}"),
        }
    }

    #[test]
    fn edit_safety_block_is_classified() {
        let service = MockService::with_edit(vec![Err(safety_block())]);
        let err = edit_image(&service, &key(), &[0], "add-detail").unwrap_err();
        assert!(err.is_safety_block());
    }
}
