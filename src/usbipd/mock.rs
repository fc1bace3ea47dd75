//! Scripted passthrough utility for testing.
//!
//! Records every invocation for later assertion and answers `list` with a
//! configurable listing.
//!
//! # Example
//!
//! ```rust,ignore
//! use wcm::usbipd::mock::MockUsbipd;
//! use wcm::usbipd::Passthrough;
//!
//! let usbipd = MockUsbipd::new().with_listing("1-2  0403:6001  Serial=A1");
//! usbipd.bind("1-2");
//! usbipd.assert_invocations(&["bind --busid 1-2"]);
//! ```

use std::collections::HashMap;
use std::sync::Mutex;

use tracing::trace;

use super::{CommandOutput, Passthrough};

/// Mock `usbipd`.
#[derive(Debug, Default)]
pub struct MockUsbipd {
    listing: Mutex<String>,
    responses: Mutex<HashMap<String, (String, String)>>,
    launch_failure: Mutex<Option<String>>,
    invocations: Mutex<Vec<String>>,
}

impl MockUsbipd {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the text returned by `list` (builder form).
    #[must_use]
    pub fn with_listing(self, listing: &str) -> Self {
        self.set_listing(listing);
        self
    }

    /// Set the text returned by `list`.
    pub fn set_listing(&self, listing: &str) {
        *self.listing.lock().unwrap() = listing.to_string();
    }

    /// Script the stdout/stderr for a verb such as `"attach"`.
    pub fn respond(&self, verb: &str, stdout: &str, stderr: &str) {
        self.responses
            .lock()
            .unwrap()
            .insert(verb.to_string(), (stdout.to_string(), stderr.to_string()));
    }

    /// Make every invocation fail to launch.
    pub fn fail_launch(&self, error: &str) {
        *self.launch_failure.lock().unwrap() = Some(error.to_string());
    }

    // === Assertions ===

    /// Every invocation so far, as space-joined argument strings.
    #[must_use]
    pub fn invocations(&self) -> Vec<String> {
        self.invocations.lock().unwrap().clone()
    }

    /// Invocations other than `list`.
    #[must_use]
    pub fn lifecycle_invocations(&self) -> Vec<String> {
        self.invocations()
            .into_iter()
            .filter(|i| i != "list")
            .collect()
    }

    /// Assert the exact non-`list` invocation sequence.
    ///
    /// # Panics
    ///
    /// Panics if the invocations don't match.
    pub fn assert_invocations(&self, expected: &[&str]) {
        let actual = self.lifecycle_invocations();
        assert_eq!(
            actual, expected,
            "Invocation mismatch.\nExpected: {expected:#?}\nActual: {actual:#?}",
        );
    }

    /// Assert nothing was run at all, `list` included.
    ///
    /// # Panics
    ///
    /// Panics if any invocation was recorded.
    pub fn assert_no_invocations(&self) {
        let all = self.invocations();
        assert!(all.is_empty(), "Expected no invocations, but found: {all:#?}");
    }

    /// Clear the invocation log for fresh assertions.
    pub fn clear_invocations(&self) {
        self.invocations.lock().unwrap().clear();
    }
}

impl Passthrough for MockUsbipd {
    fn run(&self, args: &[&str]) -> CommandOutput {
        let joined = args.join(" ");
        trace!(args = %joined, "Mock usbipd invocation");
        self.invocations.lock().unwrap().push(joined.clone());

        let command = format!("usbipd {joined}");
        if let Some(error) = self.launch_failure.lock().unwrap().clone() {
            return CommandOutput::not_launched(command, error);
        }

        let verb = args.first().copied().unwrap_or_default();
        if verb == "list" {
            return CommandOutput::completed(command, self.listing.lock().unwrap().clone(), "");
        }
        let (stdout, stderr) = self
            .responses
            .lock()
            .unwrap()
            .get(verb)
            .cloned()
            .unwrap_or_default();
        CommandOutput::completed(command, stdout, stderr)
    }
}
