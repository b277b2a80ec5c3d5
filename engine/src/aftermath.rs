//! The screen left behind once the page has "crashed".
//!
//! One programming-error visualization is picked at random per run.

use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorVisualization {
    pub title: &'static str,
    pub code: &'static str,
    /// Pseudo source or trace lines shown under the title.
    pub lines: &'static [&'static str],
    pub hint: &'static str,
}

pub static VISUALIZATIONS: [ErrorVisualization; 8] = [
    ErrorVisualization {
        title: "Stack overflow",
        code: "E_STACK_OVERFLOW",
        lines: &[
            "find_page(\"/404\")",
            "  find_page(\"/404\")",
            "    find_page(\"/404\")",
            "      ... 9,998 more frames",
        ],
        hint: "The page kept looking for itself.",
    },
    ErrorVisualization {
        title: "Null dereference",
        code: "E_NULL_POINTER",
        lines: &[
            "let page = routes.get(path);",
            "render(page.unwrap());",
            "        ^^^^ page is None",
        ],
        hint: "There was nothing at this address.",
    },
    ErrorVisualization {
        title: "Off-by-one",
        code: "E_INDEX_RANGE",
        lines: &[
            "for i in 0..=pages.len() {",
            "    show(pages[i]);",
            "}   // index 404 out of range for length 404",
        ],
        hint: "The page you wanted is one past the end.",
    },
    ErrorVisualization {
        title: "Race condition",
        code: "E_DATA_RACE",
        lines: &[
            "thread 1: page.delete()",
            "thread 2: page.render()",
            "          page already freed",
        ],
        hint: "Someone got here first.",
    },
    ErrorVisualization {
        title: "Infinite loop",
        code: "E_TIMEOUT",
        lines: &[
            "while !found {",
            "    search();",
            "}   // still searching",
        ],
        hint: "We looked everywhere. Twice. Forever.",
    },
    ErrorVisualization {
        title: "Segmentation fault",
        code: "SIGSEGV",
        lines: &[
            "Program received signal SIGSEGV",
            "0x0000000000000404 in ?? ()",
            "(core dumped)",
        ],
        hint: "This memory was never yours.",
    },
    ErrorVisualization {
        title: "Unhandled rejection",
        code: "E_UNHANDLED_PROMISE",
        lines: &[
            "fetch(\"/this-page\")",
            "  .then(render)",
            "  // no .catch()",
        ],
        hint: "The request was promised, then forgotten.",
    },
    ErrorVisualization {
        title: "Out of memory",
        code: "E_OOM",
        lines: &[
            "allocating 404 TiB for page cache",
            "memory allocation failed",
            "killed by oom-reaper",
        ],
        hint: "The page was too big to remember.",
    },
];

pub static FALLBACK_VISUALIZATION: ErrorVisualization = ErrorVisualization {
    title: "Page not found",
    code: "404",
    lines: &["GET /this-page", "HTTP/1.1 404 Not Found"],
    hint: "The page you requested does not exist.",
};

pub fn visualization_at(index: usize) -> &'static ErrorVisualization {
    VISUALIZATIONS.get(index).unwrap_or(&FALLBACK_VISUALIZATION)
}

pub fn choose_visualization<R: Rng + ?Sized>(rng: &mut R) -> &'static ErrorVisualization {
    visualization_at(rng.random_range(0..VISUALIZATIONS.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    #[test]
    fn pool_entries_are_distinct() {
        let codes: HashSet<_> = VISUALIZATIONS.iter().map(|v| v.code).collect();
        assert_eq!(codes.len(), VISUALIZATIONS.len());
        assert!(VISUALIZATIONS.iter().all(|v| !v.lines.is_empty()));
    }

    #[test]
    fn out_of_range_falls_back() {
        assert_eq!(visualization_at(0).title, "Stack overflow");
        assert_eq!(visualization_at(8), &FALLBACK_VISUALIZATION);
    }

    #[test]
    fn seeded_choice_is_reproducible() {
        let a = choose_visualization(&mut StdRng::seed_from_u64(404));
        let b = choose_visualization(&mut StdRng::seed_from_u64(404));
        assert_eq!(a, b);
        assert!(VISUALIZATIONS.contains(a));
    }
}
