// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Rendering of [`TestUnit`]s into host test source code.

use std::{collections::HashSet, fmt::Write as _};

use inflector::cases::snakecase::to_snake_case;
use itertools::Itertools as _;

use super::{
    assembler::IGNORE_TAGS,
    unit::{Resolution, ResolvedStep, TestUnit},
};
use crate::{
    document::Document,
    hook::{self, HookKind},
    pickle::PickleStepArgument,
    step::ArgumentValue,
};

/// Renderer of the test file of a single [`Document`].
///
/// Output must be a pure function of its input, so regenerating an unchanged
/// project yields byte-identical files.
pub trait Emitter {
    /// Renders the test file containing the given `units` of the `document`.
    fn emit(&self, document: &Document, units: &[TestUnit<'_>]) -> String;
}

/// [`Emitter`] of plain `#[test]` functions.
///
/// Every test constructs a fresh world with [`Default`] and passes it by
/// mutable reference to the step and hook bodies.
#[derive(Clone, Debug)]
pub struct RustEmitter {
    world: String,
}

impl RustEmitter {
    /// Creates a new [`RustEmitter`] constructing the given `world` type.
    #[must_use]
    pub fn new(world: impl Into<String>) -> Self {
        Self { world: world.into() }
    }
}

impl Default for RustEmitter {
    fn default() -> Self {
        Self::new("crate::World")
    }
}

impl Emitter for RustEmitter {
    fn emit(&self, document: &Document, units: &[TestUnit<'_>]) -> String {
        let mut out = String::new();
        _ = writeln!(
            out,
            "// Generated from `{}` by gherkin-bridge. Do not edit.\n",
            document.uri,
        );

        render_global_hooks(
            &mut out,
            &global_hooks(units, HookKind::BeforeAll),
            &global_hooks(units, HookKind::AfterAll),
        );

        let names = test_names(units);
        for (unit, name) in units.iter().zip(&names) {
            self.render_unit(&mut out, document, unit, name);
        }

        out.push_str("/// Test name, feature URI and pickle line of every test above.\n");
        out.push_str("pub const BDD_DATA: &[(&str, &str, usize)] = &[\n");
        for (unit, name) in units.iter().zip(&names) {
            _ = writeln!(
                out,
                "    ({name:?}, {:?}, {}),",
                unit.pickle.uri, unit.pickle.location.line,
            );
        }
        out.push_str("];\n");
        out
    }
}

impl RustEmitter {
    fn render_unit(
        &self,
        out: &mut String,
        document: &Document,
        unit: &TestUnit<'_>,
        name: &str,
    ) {
        let feature = &document.feature;
        _ = writeln!(out, "/// {}: {}", feature.keyword, feature.name);
        _ = writeln!(out, "/// Scenario: {}", unit.pickle.name);
        out.push_str("#[test]\n");
        if unit.ignored {
            if let Some(tag) = IGNORE_TAGS.iter().find(|t| unit.pickle.has_tag(t)) {
                _ = writeln!(out, "#[ignore = {tag:?}]");
            }
        }
        _ = writeln!(out, "fn {name}() {{");
        out.push_str("    before_all();\n");
        _ = writeln!(
            out,
            "    let mut world = <{} as ::core::default::Default>::default();",
            self.world,
        );
        for h in &unit.hooks.before {
            _ = writeln!(out, "    {}(&mut world);", h.body);
        }

        out.push_str(
            "    let outcome = ::std::panic::catch_unwind(\
             ::std::panic::AssertUnwindSafe(|| {\n",
        );
        for step in &unit.steps {
            for h in &unit.hooks.before_step {
                _ = writeln!(out, "        {}(&mut world);", h.body);
            }
            _ = writeln!(out, "        // {} {}", step.step.keyword, step.step.text);
            _ = writeln!(out, "        {}", render_step(step));
            for h in &unit.hooks.after_step {
                _ = writeln!(out, "        {}(&mut world);", h.body);
            }
        }
        out.push_str("    }));\n");

        for h in &unit.hooks.after {
            _ = writeln!(out, "    {}(&mut world);", h.body);
        }
        out.push_str("    if let Err(panic) = outcome {\n");
        out.push_str("        ::std::panic::resume_unwind(panic);\n");
        out.push_str("    }\n}\n\n");
    }
}

/// Global hooks of the given `kind` applying to at least one of the `units`,
/// in execution order.
fn global_hooks<'a>(
    units: &[TestUnit<'a>],
    kind: HookKind,
) -> Vec<&'a hook::Definition> {
    units
        .iter()
        .flat_map(|u| u.hooks.of(kind).iter().copied())
        .unique_by(|h| h.id)
        .sorted_by_key(|h| (h.order, h.id))
        .collect()
}

fn render_global_hooks(
    out: &mut String,
    before_all: &[&hook::Definition],
    after_all: &[&hook::Definition],
) {
    out.push_str("static BEFORE_ALL: ::std::sync::Once = ::std::sync::Once::new();\n\n");
    out.push_str("fn before_all() {\n");
    out.push_str("    BEFORE_ALL.call_once(|| {\n");
    for h in before_all {
        _ = writeln!(out, "        {}();", h.body);
    }
    out.push_str("    });\n}\n\n");

    out.push_str("/// Runs the `AfterAll` hooks. Called by the harness once every test\n");
    out.push_str("/// of this file has finished.\n");
    out.push_str("pub fn after_all() {\n");
    for h in after_all {
        _ = writeln!(out, "    {}();", h.body);
    }
    out.push_str("}\n\n");
}

/// Renders the call of a single step.
fn render_step(step: &ResolvedStep<'_>) -> String {
    let m = match &step.resolution {
        Resolution::Bound(m) => m,
        Resolution::Undefined => {
            return format!(
                "::core::panic!(\"undefined step: {{}}\", {:?});",
                step.step.text,
            );
        }
        Resolution::Ambiguous(_) => {
            return format!(
                "::core::panic!(\"ambiguous step: {{}}\", {:?});",
                step.step.text,
            );
        }
    };

    let mut args = vec!["&mut world".to_owned()];
    args.extend(m.arguments.iter().map(|a| literal(&a.value)));
    match &step.step.argument {
        Some(PickleStepArgument::DocString(d)) => args.push(format!("{:?}", d.content)),
        Some(PickleStepArgument::DataTable(t)) => {
            let rows = t
                .values()
                .iter()
                .map(|r| {
                    let cells =
                        r.iter().map(|c| format!("{c:?}")).collect::<Vec<_>>();
                    format!("&[{}]", cells.join(", "))
                })
                .collect::<Vec<_>>();
            args.push(format!("&[{}]", rows.join(", ")));
        }
        None => {}
    }
    format!("{}({});", m.definition.body, args.join(", "))
}

/// Renders an [`ArgumentValue`] as a Rust literal.
fn literal(value: &ArgumentValue) -> String {
    match value {
        ArgumentValue::Int(i) => i.to_string(),
        ArgumentValue::Float(f) => format!("{f:?}"),
        ArgumentValue::String(s) | ArgumentValue::Text(s) => format!("{s:?}"),
        // Never emitted for a resolved unit.
        ArgumentValue::Unrepresentable(raw) => format!(
            "::core::compile_error!({:?})",
            format!("`{raw}` does not fit its parameter type"),
        ),
    }
}

const KEYWORDS: &[&str] = &[
    "as", "async", "await", "box", "break", "const", "continue", "crate",
    "do", "dyn", "else", "enum", "extern", "false", "final", "fn", "for",
    "gen", "if", "impl", "in", "let", "loop", "macro", "match", "mod", "move",
    "mut", "override", "priv", "pub", "ref", "return", "self", "static",
    "struct", "super", "trait", "true", "try", "type", "typeof", "unsafe",
    "unsized", "use", "virtual", "where", "while", "yield",
];

/// Turns a scenario name into a valid function identifier.
fn identifier(name: &str) -> String {
    let snake = to_snake_case(name);
    let mut ident = String::with_capacity(snake.len());
    for c in snake.chars() {
        let c = if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' };
        if !(c == '_' && ident.ends_with('_')) {
            ident.push(c);
        }
    }
    let ident = ident.trim_matches('_');

    if ident.is_empty() {
        "scenario".to_owned()
    } else if ident.starts_with(|c: char| c.is_ascii_digit()) {
        format!("scenario_{ident}")
    } else if KEYWORDS.contains(&ident) {
        format!("{ident}_")
    } else {
        ident.to_owned()
    }
}

/// Names of the items [`render_global_hooks`] emits next to the tests.
const RESERVED_NAMES: &[&str] = &["after_all", "before_all"];

/// Unique test names of the given `units`, in order.
fn test_names(units: &[TestUnit<'_>]) -> Vec<String> {
    let mut taken = RESERVED_NAMES
        .iter()
        .map(|n| (*n).to_owned())
        .collect::<HashSet<_>>();
    units
        .iter()
        .map(|u| {
            let base = identifier(&u.pickle.name);
            let mut name = base.clone();
            let mut n = 1;
            while !taken.insert(name.clone()) {
                n += 1;
                name = format!("{base}_{n}");
            }
            name
        })
        .collect()
}
