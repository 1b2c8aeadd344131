//! End-to-end highlighting through the session registry.

use source_editor_core::syntax::span;
use source_editor_core::{
    AttributeUpdate, BufferId, CaptureName, HighlightConfig, HighlightError, HighlightSpan,
    SessionRegistry, TextBuffer, Theme,
};
use std::cell::RefCell;
use std::ops::Range;
use std::rc::Rc;

type Updates = Rc<RefCell<Vec<AttributeUpdate>>>;

fn attach(registry: &mut SessionRegistry, text: &str, language: &str) -> (BufferId, Updates) {
    let updates: Updates = Rc::default();
    let sink_updates = updates.clone();
    let id = registry
        .attach(
            TextBuffer::from_str(text),
            language,
            Theme::dark(),
            move |update: &AttributeUpdate| sink_updates.borrow_mut().push(update.clone()),
        )
        .unwrap();
    (id, updates)
}

fn spans(registry: &SessionRegistry, id: BufferId) -> Vec<HighlightSpan> {
    registry.get(id).unwrap().highlighter().spans().to_vec()
}

fn fresh_spans(text: &str, language: &str) -> Vec<HighlightSpan> {
    let mut registry: SessionRegistry = SessionRegistry::default();
    let (id, _) = attach(&mut registry, text, language);
    spans(&registry, id)
}

/// What a host holding one capture per byte sees after applying updates.
struct HostModel {
    captures: Vec<Option<CaptureName>>,
}

impl HostModel {
    fn new(len: usize) -> Self {
        Self {
            captures: vec![None; len],
        }
    }

    fn edit(&mut self, range: Range<usize>, text: &str) {
        self.captures.splice(range, std::iter::repeat(None).take(text.len()));
    }

    fn apply(&mut self, updates: &[AttributeUpdate]) {
        for update in updates {
            for run in &update.runs {
                for capture in &mut self.captures[run.range.clone()] {
                    *capture = run.capture;
                }
            }
        }
    }

    fn expected(spans: &[HighlightSpan], len: usize) -> Vec<Option<CaptureName>> {
        let mut captures = vec![None; len];
        for (range, capture) in span::tile(spans, &(0..len)) {
            for c in &mut captures[range] {
                *c = capture;
            }
        }
        captures
    }
}

#[test]
fn scenario_typing_a_go_function() {
    let mut registry: SessionRegistry = SessionRegistry::default();
    let (id, updates) = attach(&mut registry, "", "go");
    updates.borrow_mut().clear();

    registry.on_edit(id, 0..0, "func foo() {}").unwrap();

    let spans = spans(&registry, id);
    assert_eq!(spans[0], HighlightSpan::new(0..4, CaptureName::Keyword));
    let name = spans.iter().find(|s| s.range == (5..8)).unwrap();
    assert!(matches!(
        name.capture,
        CaptureName::Function | CaptureName::FunctionName | CaptureName::Variable | CaptureName::Identifier
    ));

    let updates = updates.borrow();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].range, 0..13);
    assert_eq!(updates[0].runs[0].range, 0..4);
    assert_eq!(updates[0].runs[0].capture, Some(CaptureName::Keyword));
}

#[test]
fn scenario_deleting_a_closing_quote() {
    let mut registry: SessionRegistry = SessionRegistry::default();
    let (id, updates) = attach(&mut registry, "x := \"abc\" + y\nz := 1\n", "go");
    let mut host = HostModel::new(22);
    host.apply(&updates.borrow());
    updates.borrow_mut().clear();

    registry.on_edit(id, 9..10, "").unwrap();
    host.edit(9..10, "");

    let session = registry.get(id).unwrap();
    let rehighlighted = session.highlighter().last_rehighlight_range().unwrap();
    assert!(rehighlighted.start <= 9);
    assert!(rehighlighted.end >= 14);

    host.apply(&updates.borrow());
    let len = session.buffer().len_bytes();
    assert_eq!(host.captures, HostModel::expected(session.highlighter().spans(), len));
}

#[test]
fn scenario_theme_switch_recolors_without_parsing() {
    let mut registry: SessionRegistry = SessionRegistry::default();
    let text = "package main\n\nfunc main() {\n\tprintln(\"hi\")\n}\n";
    let (id, updates) = attach(&mut registry, text, "go");
    let parses = registry.get(id).unwrap().highlighter().parse_count();
    updates.borrow_mut().clear();

    registry.set_theme(id, Theme::light()).unwrap();

    assert_eq!(registry.get(id).unwrap().highlighter().parse_count(), parses);
    let updates = updates.borrow();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].range, 0..text.len());
    let light = Theme::light();
    for run in &updates[0].runs {
        assert_eq!(run.attributes, light.attributes_for(run.capture));
    }
}

#[test]
fn scenario_edit_storm_while_disabled() {
    let mut registry: SessionRegistry = SessionRegistry::default();
    let (id, updates) = attach(&mut registry, "func foo() {}\n", "go");
    registry.disable_highlighting(id).unwrap();
    updates.borrow_mut().clear();

    for i in 0..50 {
        let at = 14 + i;
        registry.on_edit(id, at..at, "x").unwrap();
    }
    assert!(updates.borrow().is_empty());

    registry.enable_highlighting(id).unwrap();
    let session = registry.get(id).unwrap();
    assert_eq!(updates.borrow().len(), 1);
    assert_eq!(updates.borrow()[0].range, 0..session.buffer().len_bytes());
    assert_eq!(session.highlighter().stats().full_parses, 2);
    assert_eq!(
        session.highlighter().spans(),
        fresh_spans(&session.text(), "go").as_slice()
    );
}

#[test]
fn empty_edit_emits_nothing() {
    let mut registry: SessionRegistry = SessionRegistry::default();
    let (id, updates) = attach(&mut registry, "func a() {}\n", "go");
    let before = spans(&registry, id);
    updates.borrow_mut().clear();

    registry.on_edit(id, 4..4, "").unwrap();
    assert!(updates.borrow().is_empty());
    assert_eq!(spans(&registry, id), before);
}

#[test]
fn edit_and_undo_restore_the_highlighting() {
    let mut registry: SessionRegistry = SessionRegistry::default();
    let text = "func a() {\n\treturn\n}\n";
    let (id, _) = attach(&mut registry, text, "go");
    let before = spans(&registry, id);

    registry.on_edit(id, 12..18, "x := 1").unwrap();
    registry.on_edit(id, 12..18, "return").unwrap();

    assert_eq!(registry.get(id).unwrap().text(), text);
    assert_eq!(spans(&registry, id), before);
}

#[test]
fn updates_stay_near_the_edit() {
    let mut registry: SessionRegistry = SessionRegistry::default();
    let text = "func a() {}\n\nfunc b() {}\n\nfunc c() {}\n";
    let (id, updates) = attach(&mut registry, text, "go");
    updates.borrow_mut().clear();

    // Rename `b` to `bee`; line 3 spans bytes 13..27 afterwards.
    registry.on_edit(id, 18..19, "bee").unwrap();
    for update in updates.borrow().iter() {
        assert!(update.range.start >= 13 && update.range.end <= 27, "{:?}", update.range);
    }
    let session = registry.get(id).unwrap();
    assert_eq!(
        session.highlighter().spans(),
        fresh_spans(&session.text(), "go").as_slice()
    );
}

#[test]
fn host_converges_after_a_sequence_of_edits() {
    let mut registry: SessionRegistry = SessionRegistry::default();
    let text = "package main\n\nfunc main() {\n\tx := 1\n}\n";
    let (id, updates) = attach(&mut registry, text, "go");
    let mut host = HostModel::new(text.len());

    let edits: [(Range<usize>, &str); 5] = [
        (34..35, "42"),
        (14..18, "func"),
        (28..28, "\t// note\n"),
        (0..7, "package"),
        (45..45, " + 1"),
    ];
    for (range, text) in edits {
        host.apply(&updates.borrow());
        updates.borrow_mut().clear();
        registry.on_edit(id, range.clone(), text).unwrap();
        host.edit(range, text);
    }
    host.apply(&updates.borrow());

    let session = registry.get(id).unwrap();
    let len = session.buffer().len_bytes();
    assert_eq!(host.captures, HostModel::expected(session.highlighter().spans(), len));
}

#[test]
fn replacing_the_whole_buffer_matches_a_fresh_attach() {
    let mut registry: SessionRegistry = SessionRegistry::default();
    let text = "package main\n\nfunc main() {\n\tx := \"a\"\n}\n";
    let (id, updates) = attach(&mut registry, text, "go");
    let mut host = HostModel::new(text.len());
    host.apply(&updates.borrow());
    updates.borrow_mut().clear();

    let replacement = "// rewritten\npackage util\n\nconst limit = 10\n\nfunc Max(a, b int) int {\n\treturn a\n}\n";
    registry.on_edit(id, 0..text.len(), replacement).unwrap();
    host.edit(0..text.len(), replacement);
    host.apply(&updates.borrow());

    let session = registry.get(id).unwrap();
    assert_eq!(session.text(), replacement);
    assert_eq!(session.highlighter().spans(), fresh_spans(replacement, "go").as_slice());
    assert_eq!(
        host.captures,
        HostModel::expected(session.highlighter().spans(), replacement.len())
    );

    registry.on_edit(id, 0..replacement.len(), "").unwrap();
    assert!(spans(&registry, id).is_empty());
}

#[test]
fn spans_are_ordered_and_disjoint() {
    let mut registry: SessionRegistry = SessionRegistry::default();
    let text = "// demo\nuse std::fmt;\n\n/// Doc.\nfn main() {\n    let v = vec![1, 2];\n    println!(\"{:?}\", v);\n}\n";
    let (id, _) = attach(&mut registry, text, "rust");
    registry.on_edit(id, 8..8, "use std::io;\n").unwrap();

    let spans = spans(&registry, id);
    assert!(!spans.is_empty());
    for pair in spans.windows(2) {
        assert!(pair[0].range.end <= pair[1].range.start, "{:?}", pair);
        assert!(pair[0].range.start < pair[0].range.end);
    }
}

#[test]
fn runs_tile_every_update() {
    let mut registry: SessionRegistry = SessionRegistry::default();
    let (id, updates) = attach(&mut registry, "fn main() {\n    let s = \"x\";\n}\n", "rust");
    registry.on_edit(id, 24..24, "yz").unwrap();
    registry.set_theme(id, Theme::light()).unwrap();

    for update in updates.borrow().iter() {
        let mut pos = update.range.start;
        for run in &update.runs {
            assert_eq!(run.range.start, pos);
            assert!(run.range.end > run.range.start);
            pos = run.range.end;
        }
        assert_eq!(pos, update.range.end);
    }
}

#[test]
fn unsupported_language_falls_back_to_plain_text() {
    let mut registry: SessionRegistry = SessionRegistry::default();
    let err = registry
        .attach(TextBuffer::from_str("x"), "brainfuck", Theme::dark(), |_: &AttributeUpdate| {})
        .unwrap_err();
    assert!(matches!(err, HighlightError::UnsupportedLanguage(_)));

    let (id, updates) = attach(&mut registry, "x", "plaintext");
    assert_eq!(updates.borrow().len(), 1);
    assert!(updates.borrow()[0].runs.iter().all(|run| run.capture.is_none()));
    assert!(registry.on_idle(id).is_ok());
}

#[test]
fn background_worker_results_reach_the_host() {
    let config = HighlightConfig {
        background_queries: true,
        ..HighlightConfig::default()
    };
    let mut registry = SessionRegistry::new(source_editor_core::BuiltinGrammars, config);
    let (id, updates) = attach(&mut registry, "func foo() {}\n", "go");

    let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
    while registry.get(id).unwrap().highlighter().has_pending_work() {
        assert!(std::time::Instant::now() < deadline);
        registry.poll();
        std::thread::sleep(std::time::Duration::from_millis(1));
    }
    assert_eq!(updates.borrow().len(), 1);
    assert_eq!(spans(&registry, id), fresh_spans("func foo() {}\n", "go"));
}
