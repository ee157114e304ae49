use std::sync::LazyLock;

use regex::Regex;

/// Which report grammar produced the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    /// `<N> tests, <N> assertions, <N> failures[, <N> errors]`
    Unit,
    /// `<N> examples, <N> failures[, <N> not implemented]`
    Spec,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Fail,
}

/// Counts pulled out of the summary line. `errors` stays zero for the
/// spec grammar, which has no error column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReportCounts {
    pub run: u64,
    pub failures: u64,
    pub errors: u64,
}

/// Structured result of classifying one worker run's transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestOutcome {
    pub kind: ReportKind,
    pub verdict: Verdict,
    pub counts: ReportCounts,
    /// The raw summary text as matched, used verbatim in notifications.
    pub summary: String,
}

/// One recognized summary grammar: a pattern, which capture groups hold
/// which counts, and the rule deciding pass/fail from them.
struct ReportGrammar {
    kind: ReportKind,
    pattern: &'static LazyLock<Regex>,
    failures_group: usize,
    errors_group: Option<usize>,
    failed: fn(&ReportCounts) -> bool,
}

static UNIT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+) tests?, (\d+) assertions?, (\d+) failures?(?:, (\d+) errors?)?")
        .expect("unit report pattern")
});

static SPEC_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+) examples?, (\d+) failures?(?:, (\d+) not implemented)?")
        .expect("spec report pattern")
});

static UNIT_GRAMMAR: ReportGrammar = ReportGrammar {
    kind: ReportKind::Unit,
    pattern: &UNIT_PATTERN,
    failures_group: 3,
    errors_group: Some(4),
    failed: |c| c.failures + c.errors > 0,
};

static SPEC_GRAMMAR: ReportGrammar = ReportGrammar {
    kind: ReportKind::Spec,
    pattern: &SPEC_PATTERN,
    failures_group: 2,
    errors_group: None,
    failed: |c| c.failures > 0,
};

impl ReportGrammar {
    /// Apply this grammar to the text: first match wins, later summaries
    /// in the same transcript are ignored.
    fn try_match(&self, text: &str) -> Option<TestOutcome> {
        let caps = self.pattern.captures(text)?;

        let group = |i: usize| -> u64 {
            caps.get(i)
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(0)
        };

        let counts = ReportCounts {
            run: group(1),
            failures: group(self.failures_group),
            errors: self.errors_group.map(group).unwrap_or(0),
        };

        let verdict = if (self.failed)(&counts) {
            Verdict::Fail
        } else {
            Verdict::Pass
        };

        Some(TestOutcome {
            kind: self.kind,
            verdict,
            counts,
            summary: caps
                .get(0)
                .map(|m| m.as_str().to_string())
                .unwrap_or_default(),
        })
    }
}

/// Classify a worker run's accumulated output.
///
/// Text containing the literal token `tests` is always read with the unit
/// grammar; only text without it is tried against the spec grammar. When
/// the applicable grammar finds no summary, there is no outcome and
/// callers skip notification entirely.
pub fn classify(text: &str) -> Option<TestOutcome> {
    if text.contains("tests") {
        UNIT_GRAMMAR.try_match(text)
    } else {
        SPEC_GRAMMAR.try_match(text)
    }
}
