use super::*;
use crate::model::{Item, LabelType, ShapeGeometry};
use crate::state::{Store, TaskConfig, reducers};

struct Session {
    store: Store,
    handler: InteractionHandler,
}

impl Session {
    fn new(task: TaskConfig, items: usize) -> Self {
        let mut state = State::new(task);
        for i in 0..items {
            state = reducers::new_item(&state, |index, url| Item::new(index, url), &format!("{i}.jpg"));
        }
        let store = Store::new(reducers::init_session(&state));
        let mut handler = InteractionHandler::default();
        handler.update_state(store.state());
        Self { store, handler }
    }

    fn boxes() -> Self {
        Self::new(TaskConfig::default(), 1)
    }

    fn sync(&mut self) {
        self.handler.update_state(self.store.state());
    }

    fn dispatch(&mut self, action: Action) {
        self.store.dispatch(action);
        self.sync();
    }

    fn hover(&mut self, x: f32, y: f32) {
        let coord = Vector2d::new(x, y);
        let hit = self.handler.hit_test(coord);
        self.handler
            .pointer_move(coord, Size::unbounded(), hit, &mut self.store);
        self.sync();
    }

    fn down(&mut self, x: f32, y: f32) {
        self.handler.pointer_down(Vector2d::new(x, y));
        self.sync();
    }

    fn up(&mut self, x: f32, y: f32) -> Option<Gesture> {
        let coord = Vector2d::new(x, y);
        let hit = self.handler.hit_test(coord);
        let gesture = self
            .handler
            .pointer_up(coord, Size::unbounded(), hit, &mut self.store);
        self.sync();
        gesture
    }

    fn click(&mut self, x: f32, y: f32) -> Option<Gesture> {
        self.hover(x, y);
        self.down(x, y);
        self.up(x, y)
    }

    fn drag(&mut self, from: (f32, f32), to: (f32, f32)) -> Option<Gesture> {
        self.hover(from.0, from.1);
        self.down(from.0, from.1);
        self.hover(to.0, to.1);
        self.up(to.0, to.1)
    }

    fn key(&mut self, key: Key) {
        self.handler.key_down(key, &mut self.store);
        self.sync();
        self.handler.key_up(key);
    }

    fn labels(&self) -> Vec<&crate::model::Label> {
        self.store
            .state()
            .current_item()
            .map(|item| item.labels.values().collect())
            .unwrap_or_default()
    }

    fn drawable_ids(&self) -> Vec<LabelId> {
        self.labels()
            .iter()
            .filter(|label| label.label_type.is_drawable())
            .map(|label| label.id)
            .collect()
    }

    fn selected(&self) -> Vec<LabelId> {
        let mut ids = self.store.state().current.selected_labels.clone();
        ids.sort_unstable();
        ids
    }
}

#[test]
fn test_small_motion_is_click() {
    let mut session = Session::boxes();
    session.down(0.0, 0.0);
    assert_eq!(session.handler.gesture(), GestureState::PointerDown);
    assert_eq!(session.up(2.0, 2.0), Some(Gesture::Click));

    assert!(session.labels().is_empty());
    assert!(session.handler.context().labels().is_empty());
    assert_eq!(session.handler.gesture(), GestureState::Idle);
}

#[test]
fn test_drag_commits_box() {
    let mut session = Session::boxes();
    session.down(0.0, 0.0);
    assert_eq!(session.up(4.0, 4.0), Some(Gesture::DragEnd));

    let labels = session.labels();
    assert_eq!(labels.len(), 1);
    assert_eq!(labels[0].label_type, LabelType::Box2d);
    let item = session.store.state().current_item().expect("item");
    assert_eq!(
        item.shapes[&labels[0].shapes[0]].geometry,
        ShapeGeometry::rect(0.0, 0.0, 4.0, 4.0)
    );
    assert_eq!(session.selected(), vec![labels[0].id]);
    assert_eq!(session.handler.context().selected_ids(), vec![labels[0].id]);
}

#[test]
fn test_drag_threshold_on_move() {
    let mut session = Session::boxes();
    session.hover(10.0, 10.0);
    session.down(10.0, 10.0);
    session.hover(11.0, 11.0);
    assert_eq!(session.handler.gesture(), GestureState::PointerDown);
    session.hover(40.0, 30.0);
    assert_eq!(session.handler.gesture(), GestureState::Dragging);
    assert_eq!(session.up(40.0, 30.0), Some(Gesture::DragEnd));

    let label = session.labels()[0].clone();
    let item = session.store.state().current_item().expect("item");
    assert_eq!(
        item.shapes[&label.shapes[0]].geometry,
        ShapeGeometry::rect(10.0, 10.0, 30.0, 20.0)
    );
}

#[test]
fn test_pointer_up_without_down_is_noop() {
    let mut session = Session::boxes();
    assert_eq!(session.up(5.0, 5.0), None);
    assert_eq!(session.store.dispatched(), 0);
}

#[test]
fn test_polygon_pending_until_closed() {
    let mut session = Session::boxes();
    session.dispatch(Action::SetLabelType { index: 1 });

    for (x, y) in [(0.0, 0.0), (100.0, 0.0), (100.0, 100.0)] {
        assert_eq!(session.click(x, y), Some(Gesture::Click));
        assert!(session.labels().is_empty());
        assert_eq!(session.handler.gesture(), GestureState::Editing);
    }
    assert_eq!(session.handler.context().labels().len(), 1);

    session.click(3.0, 3.0);
    let labels = session.labels();
    assert_eq!(labels.len(), 1);
    assert_eq!(labels[0].label_type, LabelType::Polygon2d);
    assert_eq!(labels[0].shapes.len(), 3);
    assert_eq!(session.handler.gesture(), GestureState::Idle);
}

#[test]
fn test_finish_key_commits_polygon() {
    let mut session = Session::boxes();
    session.dispatch(Action::SetLabelType { index: 1 });
    for (x, y) in [(0.0, 0.0), (100.0, 0.0), (100.0, 100.0), (0.0, 100.0)] {
        session.click(x, y);
    }
    session.key(Key::Enter);

    let labels = session.labels();
    assert_eq!(labels.len(), 1);
    assert_eq!(labels[0].shapes.len(), 4);
}

#[test]
fn test_escape_removes_polygon_draft() {
    let mut session = Session::boxes();
    session.dispatch(Action::SetLabelType { index: 1 });
    session.click(0.0, 0.0);
    session.click(100.0, 0.0);
    session.key(Key::Escape);

    assert!(session.handler.context().labels().is_empty());
    assert!(session.handler.context().selected().is_empty());
    assert!(session.labels().is_empty());
    assert_eq!(session.handler.gesture(), GestureState::Idle);
}

#[test]
fn test_backspace_on_single_vertex_removes_draft() {
    let mut session = Session::boxes();
    session.dispatch(Action::SetLabelType { index: 1 });
    session.click(10.0, 10.0);
    session.key(Key::Backspace);
    assert!(session.handler.context().labels().is_empty());
}

#[test]
fn test_pending_draft_survives_unrelated_updates() {
    let mut session = Session::new(TaskConfig::default(), 2);
    session.dispatch(Action::SetLabelType { index: 1 });
    session.click(10.0, 10.0);
    session.dispatch(Action::ToggleAssistantView);
    assert_eq!(session.handler.context().labels().len(), 1);

    session.dispatch(Action::GoToItem { item: 1 });
    assert!(session.handler.context().labels().is_empty());
}

/// Draw three separate boxes, returning their ids in drawing order.
fn three_boxes(session: &mut Session) -> Vec<LabelId> {
    session.drag((0.0, 0.0), (40.0, 40.0));
    session.drag((100.0, 0.0), (140.0, 40.0));
    session.drag((200.0, 0.0), (240.0, 40.0));
    let ids = session.drawable_ids();
    assert_eq!(ids.len(), 3);
    ids
}

#[test]
fn test_click_selects_existing_label() {
    let mut session = Session::boxes();
    let ids = three_boxes(&mut session);
    assert_eq!(session.selected(), vec![ids[2]]);

    assert_eq!(session.click(20.0, 20.0), Some(Gesture::Click));
    assert_eq!(session.selected(), vec![ids[0]]);
    assert_eq!(session.drawable_ids().len(), 3);
}

#[test]
fn test_click_on_empty_canvas_clears_selection() {
    let mut session = Session::boxes();
    let ids = three_boxes(&mut session);
    session.click(20.0, 20.0);
    assert_eq!(session.selected(), vec![ids[0]]);

    session.click(500.0, 500.0);
    assert!(session.selected().is_empty());
    assert!(session.handler.context().labels().iter().all(|l| l.label_id().is_some()));
}

#[test]
fn test_multi_select_and_link_keys() {
    let mut session = Session::boxes();
    let ids = three_boxes(&mut session);

    session.click(20.0, 20.0);
    session.handler.key_down(Key::Control, &mut session.store);
    session.click(120.0, 20.0);
    session.handler.key_up(Key::Control);
    assert_eq!(session.selected(), vec![ids[0], ids[1]]);

    session.key(Key::Char('l'));
    let item = session.store.state().current_item().expect("item");
    let mut linked = linked_label_ids(item, ids[0]);
    linked.sort_unstable();
    assert_eq!(linked, vec![ids[0], ids[1]]);

    // A plain click replaces the selection with the clicked label's group.
    session.click(220.0, 20.0);
    assert_eq!(session.selected(), vec![ids[2]]);
    session.click(20.0, 20.0);
    assert_eq!(session.selected(), vec![ids[0], ids[1]]);
    assert_eq!(session.store.state().current.label, Some(ids[0]));

    // With the modifier held the whole group toggles out.
    session.handler.key_down(Key::Meta, &mut session.store);
    session.click(120.0, 20.0);
    session.handler.key_up(Key::Meta);
    assert!(session.selected().is_empty());

    session.click(20.0, 20.0);
    session.key(Key::Char('L'));
    let item = session.store.state().current_item().expect("item");
    assert_eq!(linked_label_ids(item, ids[0]), vec![ids[0]]);
    assert_eq!(item.labels.len(), 3);
}

#[test]
fn test_link_needs_two_labels() {
    let mut session = Session::boxes();
    three_boxes(&mut session);
    session.click(20.0, 20.0);
    let before = session.store.dispatched();
    session.key(Key::Char('l'));
    assert_eq!(session.store.dispatched(), before);
}

#[test]
fn test_corner_drag_updates_existing_label() {
    let mut session = Session::boxes();
    session.drag((0.0, 0.0), (40.0, 40.0));
    let id = session.drawable_ids()[0];

    assert_eq!(session.drag((40.0, 40.0), (60.0, 50.0)), Some(Gesture::DragEnd));
    assert_eq!(session.drawable_ids(), vec![id]);
    let state = session.store.state();
    let label = state.label(0, id).expect("label");
    let item = state.item(0).expect("item");
    assert_eq!(
        item.shapes[&label.shapes[0]].geometry,
        ShapeGeometry::rect(0.0, 0.0, 60.0, 50.0)
    );
    assert_eq!(item.shapes[&label.shapes[4]].geometry.position(), Vector2d::new(60.0, 25.0));
}

#[test]
fn test_tracked_edit_propagates() {
    let mut session = Session::new(
        TaskConfig {
            tracking: true,
            ..Default::default()
        },
        3,
    );
    session.drag((0.0, 0.0), (40.0, 40.0));
    assert_eq!(session.store.state().tracks.len(), 1);
    let track = *session.store.state().tracks.keys().next().expect("track");

    session.dispatch(Action::GoToItem { item: 2 });
    assert_eq!(session.handler.context().labels().len(), 1);
    session.drag((40.0, 40.0), (60.0, 60.0));

    let state = session.store.state();
    let occurrences = &state.tracks[&track].occurrences;
    let edited = state.label(2, occurrences[&2]).expect("edited");
    assert!(edited.manual);

    let predicted = state.label(1, occurrences[&1]).expect("predicted");
    assert!(!predicted.manual);
    let item = state.item(1).expect("item");
    assert_eq!(
        item.shapes[&predicted.shapes[5]].geometry.position(),
        Vector2d::new(50.0, 50.0)
    );
}

#[test]
fn test_out_of_range_handle_hit_is_ignored() {
    let mut session = Session::boxes();
    session.drag((0.0, 0.0), (40.0, 40.0));
    let id = session.drawable_ids()[0];

    let stale = Hit { label: 0, handle: 21 };
    session
        .handler
        .pointer_move(Vector2d::new(20.0, 20.0), Size::unbounded(), Some(stale), &mut session.store);
    assert_eq!(session.handler.context().highlighted(), None);

    session.down(20.0, 20.0);
    let stale = Hit { label: 0, handle: 21 };
    session
        .handler
        .pointer_move(Vector2d::new(35.0, 35.0), Size::unbounded(), Some(stale), &mut session.store);
    session.up(35.0, 35.0);

    let state = session.store.state();
    let label = state.label(0, id).expect("label");
    let item = state.item(0).expect("item");
    assert_eq!(
        item.shapes[&label.shapes[0]].geometry,
        ShapeGeometry::rect(0.0, 0.0, 40.0, 40.0)
    );
}

#[test]
fn test_polygon_draft_starts_at_drag_origin() {
    let mut session = Session::boxes();
    session.dispatch(Action::SetLabelType { index: 1 });
    assert_eq!(session.drag((0.0, 0.0), (50.0, 50.0)), Some(Gesture::DragEnd));

    let draft = session.handler.context().label(0).expect("draft");
    let vertices: Vec<Vector2d> = draft
        .shape_objects()
        .geometry
        .iter()
        .map(ShapeGeometry::position)
        .collect();
    assert_eq!(vertices, vec![Vector2d::new(0.0, 0.0), Vector2d::new(50.0, 50.0)]);
    assert_eq!(session.handler.gesture(), GestureState::Editing);
}

#[test]
fn test_multi_select_click_on_empty_canvas_keeps_selection() {
    let mut session = Session::boxes();
    let ids = three_boxes(&mut session);
    session.click(20.0, 20.0);
    session.dispatch(Action::SetLabelType { index: 1 });

    session.handler.key_down(Key::Control, &mut session.store);
    session.click(500.0, 500.0);
    session.handler.key_up(Key::Control);

    assert_eq!(session.selected(), vec![ids[0]]);
    assert!(session.handler.context().labels().iter().all(|l| l.label_id().is_some()));
    assert_eq!(session.handler.gesture(), GestureState::Idle);

    session.click(120.0, 20.0);
    assert_eq!(session.selected(), vec![ids[1]]);
}

#[test]
fn test_link_key_is_forwarded_to_selected_labels() {
    let mut session = Session::boxes();
    let mut bindings = KeyBindings::default();
    bindings.set_key(KeyCommand::Finish, Key::Char('f'));
    bindings.set_key(KeyCommand::Link, Key::Enter);
    session.handler = InteractionHandler::new(bindings, HANDLE_HIT_RADIUS);
    session.sync();

    session.dispatch(Action::SetLabelType { index: 1 });
    for (x, y) in [(0.0, 0.0), (100.0, 0.0), (100.0, 100.0)] {
        session.click(x, y);
    }
    session.key(Key::Enter);

    let labels = session.labels();
    assert_eq!(labels.len(), 1);
    assert_eq!(labels[0].shapes.len(), 3);
    assert_eq!(session.handler.gesture(), GestureState::Idle);
}
