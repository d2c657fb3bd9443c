//! Scripted quiz stream for `GET /quiz`.

use std::io::Write;
use std::time::Duration;

use super::sse::STREAM_HEAD;
use super::{Fragment, MergeMode, Signals};
use crate::core::LiveError;

const STEP_DELAY: Duration = Duration::from_millis(500);
const ANSWER: f64 = 4.0;

/// One step of a finite script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Push(Fragment),
    Pause(Duration),
}

fn answer(text: &str) -> String {
    format!(r#"<section id="answer">{text}</section>"#)
}

/// The teacher "thinks" for a while, then grades `question`.
pub fn quiz(signals: &Signals) -> Vec<Step> {
    let verdict = if signals.number_equals("question", ANSWER) {
        "Your answer is correct :)"
    } else {
        "Your answer is wrong :("
    };

    let mut steps = vec![
        Step::Push(Fragment::remove("#answer")),
        Step::Push(Fragment::merge_at(
            answer("The teacher is answering"),
            MergeMode::After,
            "#form",
        )),
        Step::Pause(STEP_DELAY),
    ];
    for dots in [".", "..", "..."] {
        steps.push(Step::Push(Fragment::merge(answer(&format!(
            "The teacher is answering{dots}"
        )))));
        steps.push(Step::Pause(STEP_DELAY));
    }
    steps.push(Step::Push(Fragment::merge(answer(verdict))));
    steps
}

/// Write the stream head and every step, then return so the caller closes.
///
/// `sleep` performs the pauses. Returns the number of fragments written.
pub fn play<W: Write>(
    out: &mut W,
    steps: &[Step],
    mut sleep: impl FnMut(Duration),
) -> Result<usize, LiveError> {
    let mut written = 0;
    write_flush(out, STREAM_HEAD)?;
    for step in steps {
        match step {
            Step::Push(fragment) => {
                write_flush(out, &fragment.encode())?;
                written += 1;
            }
            Step::Pause(delay) => sleep(*delay),
        }
    }
    Ok(written)
}

fn write_flush<W: Write>(out: &mut W, text: &str) -> Result<(), LiveError> {
    out.write_all(text.as_bytes())
        .and_then(|()| out.flush())
        .map_err(|_| LiveError::ChannelFault)
}
