pub mod intent;
pub mod routines;

pub use intent::{ButtonTrigger, Intent, TRIGGERS, TriggerRegistry, classify};
pub use routines::RoutineTiming;

use crate::evidence::EvidenceSink;
use crate::page::PageHandle;
use crate::results::VerificationOutcome;

/// Runs the verification routines an instruction text calls for
#[derive(Debug, Clone)]
pub struct Dispatcher {
    sink: EvidenceSink,
    timing: RoutineTiming,
}

impl Dispatcher {
    pub fn new(sink: EvidenceSink, timing: RoutineTiming) -> Self {
        Self { sink, timing }
    }

    /// Run every routine `instructions` selects, then the structural checks.
    ///
    /// `requested_url` is where the run started; the final URL is compared
    /// against it. Outcomes are returned in execution order.
    pub async fn dispatch<P: PageHandle + ?Sized>(
        &self,
        page: &mut P,
        instructions: &str,
        requested_url: &str,
    ) -> Vec<VerificationOutcome> {
        let mut outcomes = Vec::new();
        self.dispatch_into(page, instructions, requested_url, &mut outcomes).await;
        outcomes
    }

    /// Like [`Dispatcher::dispatch`], appending each outcome to `outcomes` as
    /// soon as its routine finishes.
    pub async fn dispatch_into<P: PageHandle + ?Sized>(
        &self,
        page: &mut P,
        instructions: &str,
        requested_url: &str,
        outcomes: &mut Vec<VerificationOutcome>,
    ) {
        let intents = classify(instructions);
        ::log::info!("Instruction text selected {} intent(s)", intents.len());
        ::log::debug!("Intents: {:?}", intents);

        let mut scripted_click = false;

        for intent in &intents {
            match intent {
                Intent::ClickButton { label, scripted: true } => {
                    scripted_click = true;
                    outcomes.push(
                        routines::scripted_click(page, label, &self.sink, &self.timing).await,
                    );
                }
                Intent::ClickButton {
                    label,
                    scripted: false,
                } => {
                    outcomes
                        .push(routines::button_click(page, label, &self.sink, &self.timing).await);
                }
                Intent::CaptureScreenshot { names } => {
                    outcomes.push(routines::capture_screenshots(page, names, &self.sink).await);
                }
                Intent::SubmitForm {
                    form_selector,
                    fields,
                } => {
                    outcomes.push(
                        routines::submit_form(
                            page,
                            form_selector.as_deref(),
                            fields,
                            &self.sink,
                            &self.timing,
                        )
                        .await,
                    );
                }
                Intent::NoOp => {
                    ::log::debug!("No trigger phrase found, running structural checks only");
                }
            }
        }

        outcomes.extend(routines::landmarks(page).await);
        outcomes.push(routines::body(page).await);
        outcomes.push(routines::url_note(page, requested_url, scripted_click).await);
    }
}
