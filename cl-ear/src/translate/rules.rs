// SPDX-License-Identifier: GPL-3.0-or-later

//! Rule tables for rewriting `cl.exe` switches into clang flags.
//!
//! A [`RuleTable`] is plain data: sets and maps of switches and their
//! replacements. The matching order lives in [`PRIORITY`], an ordered list of
//! [`RuleClass`] values. Each class knows how to look itself up in the table,
//! and the first class that produces a result wins.
//!
//! The mapping is heuristic. See `CLCompatOptions.td` in the LLVM sources for
//! the switches clang-cl itself understands.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

/// Leading marker of the source dialect flags: `/c`, `/O2`.
pub const SWITCH_MARKER: char = '/';
/// Leading marker of the target dialect flags: `-c`, `-O2`.
pub const TARGET_MARKER: char = '-';

pub const SOURCE_INCLUDE: &str = "/I";
pub const TARGET_INCLUDE: &str = "-I";

pub const SOURCE_DEFINE: &str = "/D";
pub const TARGET_DEFINE: &str = "-D";

/// Trailing marker which turns a toggle switch off: `/Oy-`.
pub const TOGGLE_DISABLE_SUFFIX: char = '-';
pub const TOGGLE_ENABLE: &str = "-f";
pub const TOGGLE_DISABLE: &str = "-fno-";

/// The classes of rules, in the order they are tried.
///
/// The include form comes first, because it needs no table lookup. Exact
/// matches are checked before prefix matches, so a mapped flag can not be
/// shadowed by an ignored prefix.
pub const PRIORITY: [RuleClass; 6] = [
    RuleClass::IncludePath,
    RuleClass::Ignored,
    RuleClass::IgnoredByPrefix,
    RuleClass::Direct,
    RuleClass::Sequence,
    RuleClass::Toggle,
];

/// One kind of translation rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleClass {
    /// `/I<path>` becomes `-I<path>`, the path is kept verbatim.
    IncludePath,
    /// The flag is consumed and produces nothing.
    Ignored,
    /// Any flag starting with one of the listed prefixes is consumed.
    IgnoredByPrefix,
    /// The flag maps to exactly one flag.
    Direct,
    /// The flag maps to an ordered sequence of flags.
    Sequence,
    /// `/<name>` maps to `-f<replacement>`, `/<name>-` to `-fno-<replacement>`.
    Toggle,
}

impl RuleClass {
    /// Applies this class of rules on the flag.
    ///
    /// Returns `None` when the class has no rule for the flag. An empty vector
    /// means the flag was recognized and dropped on purpose.
    pub fn apply(&self, table: &RuleTable, flag: &str) -> Option<Vec<String>> {
        match self {
            RuleClass::IncludePath => flag
                .strip_prefix(SOURCE_INCLUDE)
                .map(|path| vec![format!("{TARGET_INCLUDE}{path}")]),
            RuleClass::Ignored => table.ignored.contains(flag).then(Vec::new),
            RuleClass::IgnoredByPrefix => table
                .ignored_prefixes
                .iter()
                .any(|prefix| flag.starts_with(prefix))
                .then(Vec::new),
            RuleClass::Direct => table
                .direct
                .get(flag)
                .map(|replacement| vec![replacement.to_string()]),
            RuleClass::Sequence => table
                .sequences
                .get(flag)
                .map(|replacements| replacements.iter().map(|s| s.to_string()).collect()),
            RuleClass::Toggle => {
                let name = flag.strip_prefix(SWITCH_MARKER)?;
                let (name, marker) = match name.strip_suffix(TOGGLE_DISABLE_SUFFIX) {
                    Some(stripped) => (stripped, TOGGLE_DISABLE),
                    None => (name, TOGGLE_ENABLE),
                };
                table
                    .toggles
                    .get(name)
                    .map(|replacement| vec![format!("{marker}{replacement}")])
            }
        }
    }
}

/// Immutable lookup tables used by the translator.
///
/// Build it once, then share it by reference. The table for `cl.exe` is
/// available through [`RuleTable::msvc`].
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    ignored: HashSet<&'static str>,
    ignored_prefixes: Vec<&'static str>,
    direct: HashMap<&'static str, &'static str>,
    sequences: HashMap<&'static str, &'static [&'static str]>,
    toggles: HashMap<&'static str, &'static str>,
}

impl RuleTable {
    /// The rules for translating `cl.exe` invocations to clang.
    pub fn msvc() -> &'static RuleTable {
        &MSVC_RULES
    }

    pub fn ignore(mut self, flag: &'static str) -> Self {
        self.ignored.insert(flag);
        self
    }

    /// Prefixes are scanned in insertion order.
    pub fn ignore_prefix(mut self, prefix: &'static str) -> Self {
        self.ignored_prefixes.push(prefix);
        self
    }

    pub fn map(mut self, flag: &'static str, replacement: &'static str) -> Self {
        self.direct.insert(flag, replacement);
        self
    }

    pub fn map_sequence(mut self, flag: &'static str, replacements: &'static [&'static str]) -> Self {
        self.sequences.insert(flag, replacements);
        self
    }

    /// The name is given without the leading switch marker.
    pub fn toggle(mut self, name: &'static str, replacement: &'static str) -> Self {
        self.toggles.insert(name, replacement);
        self
    }

    /// The switches which are dropped on an exact match.
    pub fn ignored_flags(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.ignored.iter().copied()
    }

    /// Every switch that has an exact entry in the table.
    pub fn exact_flags(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.ignored_flags()
            .chain(self.direct.keys().copied())
            .chain(self.sequences.keys().copied())
    }
}

static MSVC_RULES: LazyLock<RuleTable> = LazyLock::new(|| {
    RuleTable::default()
        // Suppresses display of sign-on banner.
        .ignore("/nologo")
        // Minimal rebuild.
        .ignore("/Gm")
        .ignore("/Gm-")
        // C++ exception models.
        .ignore("/EHsc")
        .ignore("/EHc")
        // Runtime checks and buffer security checks. (replaced with sanitizers)
        .ignore("/RTC1")
        .ignore("/RTCs")
        .ignore("/RTCu")
        .ignore("/RTCsu")
        .ignore("/RTCc")
        .ignore("/GS")
        .ignore("/GS-")
        .ignore("/sdl")
        .ignore("/sdl-")
        // Static/Dynamic and Debug/Release runtime libraries (no direct replacement)
        .ignore("/MT")
        .ignore("/MTd")
        .ignore("/MD")
        .ignore("/MDd")
        // Floating point calculations, default and strict behaviors.
        .ignore("/fp:precise")
        .ignore("/fp:except")
        .ignore("/fp:strict")
        // Additional analysis passes.
        .ignore("/analyze")
        .ignore("/analyze-")
        // Build system plumbing.
        .ignore("/FS")
        .ignore("/bigobj")
        // Equal to clang defaults.
        .ignore("/Gd")
        .ignore("/WX-")
        .ignore("/permissive-")
        .ignore("/utf-8")
        // Output files: `/Fo` would be `-o<file>`, but the database records no output.
        .ignore_prefix("/Fd")
        .ignore_prefix("/Fo")
        .ignore_prefix("/Fe")
        .ignore_prefix("/Fa")
        .ignore_prefix("/Fi")
        .ignore_prefix("/Fp")
        // Precompiled headers.
        .ignore_prefix("/Yc")
        .ignore_prefix("/Yu")
        // Switch MSVC back to standard behavior.
        .ignore_prefix("/Zc")
        // Parallel build, `/MP` or `/MP8`.
        .ignore_prefix("/MP")
        // Individual warning numbers: disable, as error, once.
        .ignore_prefix("/wd")
        .ignore_prefix("/we")
        .ignore_prefix("/wo")
        .ignore_prefix("/external:")
        .ignore_prefix("/diagnostics:")
        .ignore_prefix("/errorReport:")
        .map("/c", "-c")
        .map("/Od", "-O0")
        .map("/O1", "-Os")
        .map("/O2", "-O2")
        .map("/P", "-E")
        .map("/Zi", "-g")
        .map("/Z7", "-g")
        .map("/Zs", "-fsyntax-only")
        .map("/fp:fast", "-ffast-math")
        .map("/W0", "-w")
        .map("/W1", "-Wall")
        .map("/W2", "-Wall")
        .map("/W3", "-Wall")
        .map("/Wall", "-Weverything")
        .map("/WX", "-Werror")
        .map("/std:c++14", "-std=c++14")
        .map("/std:c++17", "-std=c++17")
        .map("/std:c++20", "-std=c++20")
        .map("/std:c11", "-std=c11")
        .map("/std:c17", "-std=c17")
        .map_sequence("/Tp", &["-x", "c++"])
        .map_sequence("/TP", &["-x", "c++"])
        .map_sequence("/Tc", &["-x", "c"])
        .map_sequence("/TC", &["-x", "c"])
        .map_sequence("/W4", &["-Wall", "-Wextra"])
        .toggle("Oy", "omit-frame-pointer")
        .toggle("Oi", "builtin")
        .toggle("GR", "rtti")
        .toggle("Gy", "function-sections")
        .toggle("Gw", "data-sections")
});
