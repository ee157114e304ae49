use crate::config::NotifyConfig;
use crate::report::TestOutcome;

/// Desktop notification urgency levels, mirroring the sink's own flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    // Accepted by the sink; nothing currently sends at this level.
    #[allow(dead_code)]
    Low,
    Normal,
    Critical,
}

impl Urgency {
    fn as_flag(self) -> &'static str {
        match self {
            Urgency::Low => "low",
            Urgency::Normal => "normal",
            Urgency::Critical => "critical",
        }
    }
}

/// Dispatches pass/fail notifications through `notify-send`.
///
/// Stateless and fire-and-forget: the binary is probed before every call,
/// and a host without it (or a failed invocation) silently drops the
/// notification. Nothing here can take the harness down.
#[derive(Debug, Clone)]
pub struct Notifier {
    /// Name of the notification binary looked up on PATH.
    program: String,
    pass_icon: String,
    fail_icon: String,
}

impl Notifier {
    pub fn new(config: &NotifyConfig) -> Self {
        Self {
            program: "notify-send".to_string(),
            pass_icon: config.pass_icon.clone(),
            fail_icon: config.fail_icon.clone(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_program(program: &str, config: &NotifyConfig) -> Self {
        Self {
            program: program.to_string(),
            ..Self::new(config)
        }
    }

    /// Send one notification. No-op when the sink binary is absent.
    pub async fn notify(
        &self,
        title: &str,
        message: &str,
        icon: &str,
        urgency: Urgency,
        persist: bool,
    ) {
        let Ok(program) = which::which(&self.program) else {
            tracing::debug!(program = %self.program, "notification sink not on PATH, skipping");
            return;
        };

        let mut cmd = tokio::process::Command::new(program);
        cmd.arg("-i")
            .arg(icon)
            .arg("-u")
            .arg(urgency.as_flag());
        if persist {
            // Expire time zero keeps the bubble up until dismissed.
            cmd.arg("-t").arg("0");
        }
        cmd.arg(title).arg(message);

        match cmd.status().await {
            Ok(status) if !status.success() => {
                tracing::warn!(%status, "notification command exited unsuccessfully");
            }
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(error = %err, "failed to run notification command");
            }
        }
    }

    pub async fn notify_pass(&self, outcome: &TestOutcome) {
        self.notify(
            "Tests Passed",
            &outcome.summary,
            &self.pass_icon,
            Urgency::Normal,
            false,
        )
        .await;
    }

    pub async fn notify_fail(&self, outcome: &TestOutcome) {
        self.notify(
            "Tests Failed",
            &outcome.summary,
            &self.fail_icon,
            Urgency::Critical,
            true,
        )
        .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::classify;

    #[tokio::test]
    async fn test_missing_sink_is_a_noop() {
        let notifier =
            Notifier::with_program("definitely-not-a-real-binary-7f3a", &NotifyConfig::default());
        // Must return without panicking or erroring.
        notifier
            .notify("title", "message", "face-smile", Urgency::Normal, false)
            .await;
    }

    #[tokio::test]
    async fn test_wrappers_survive_missing_sink() {
        let notifier =
            Notifier::with_program("definitely-not-a-real-binary-7f3a", &NotifyConfig::default());
        let outcome = classify("2 tests, 2 assertions, 1 failures").expect("fail outcome");
        notifier.notify_fail(&outcome).await;
        notifier.notify_pass(&outcome).await;
    }

    #[test]
    fn test_urgency_flags() {
        assert_eq!(Urgency::Low.as_flag(), "low");
        assert_eq!(Urgency::Normal.as_flag(), "normal");
        assert_eq!(Urgency::Critical.as_flag(), "critical");
    }
}
