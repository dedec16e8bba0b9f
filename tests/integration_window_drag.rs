use tickerdesk::host::{Desktop, WindowHost};
use tickerdesk::stack::StackOrder;
use tickerdesk::window::{
    FloatRect, Interaction, PointerEvent, Ticker, UtilityKind, WindowController, WindowId,
    WindowSpec,
};

fn ticker(s: &str) -> WindowId {
    WindowId::Ticker(Ticker::parse(s).unwrap())
}

fn desktop_with(windows: &[(WindowId, FloatRect)]) -> (Desktop, StackOrder, WindowController) {
    let mut desk = Desktop::new();
    let mut ctl = WindowController::new(200, 150);
    for (id, rect) in windows {
        desk.create(WindowSpec::new(id.clone(), *rect)).unwrap();
        ctl.attach(id, &mut desk);
    }
    (desk, StackOrder::new(), ctl)
}

#[test]
fn drag_moves_window_with_the_pointer() {
    let id = ticker("AAPL");
    let (mut desk, mut stack, mut ctl) =
        desktop_with(&[(id.clone(), FloatRect::new(50, 50, 320, 224))]);

    assert!(ctl.handle_pointer(PointerEvent::down(100, 58), &mut desk, &mut stack));
    assert!(ctl.is_capturing());
    assert_eq!(stack.active(), Some(&id));
    ctl.handle_pointer(PointerEvent::moved(140, 68), &mut desk, &mut stack);
    ctl.handle_pointer(PointerEvent::up(140, 68), &mut desk, &mut stack);

    let window = desk.window(&id).unwrap();
    assert_eq!((window.rect.top, window.rect.left), (60, 90));
    assert_eq!(window.interaction, Interaction::Idle);
    assert!(!ctl.is_capturing());

    // Moves after release are ignored.
    assert!(!ctl.handle_pointer(PointerEvent::moved(400, 400), &mut desk, &mut stack));
    assert_eq!(desk.window(&id).unwrap().rect.left, 90);
}

#[test]
fn resize_tracks_delta_and_respects_floor() {
    let id = ticker("MSFT");
    let (mut desk, mut stack, mut ctl) =
        desktop_with(&[(id.clone(), FloatRect::new(0, 0, 200, 150))]);

    assert!(ctl.handle_pointer(PointerEvent::down(196, 140), &mut desk, &mut stack));
    let window = desk.window(&id).unwrap();
    assert_eq!(window.interaction, Interaction::Resizing);
    assert!(window.resize_hint);

    ctl.handle_pointer(PointerEvent::moved(296, 240), &mut desk, &mut stack);
    let rect = desk.window(&id).unwrap().rect;
    assert_eq!((rect.width, rect.height), (300, 250));

    ctl.handle_pointer(PointerEvent::moved(-1000, -1000), &mut desk, &mut stack);
    let rect = desk.window(&id).unwrap().rect;
    assert_eq!((rect.width, rect.height), (200, 150));

    ctl.handle_pointer(PointerEvent::up(0, 0), &mut desk, &mut stack);
    let window = desk.window(&id).unwrap();
    assert_eq!(window.interaction, Interaction::Idle);
    assert!(!window.resize_hint);
}

#[test]
fn only_one_window_is_captured_at_a_time() {
    let a = ticker("AAPL");
    let b = ticker("MSFT");
    let (mut desk, mut stack, mut ctl) = desktop_with(&[
        (a.clone(), FloatRect::new(0, 0, 320, 224)),
        (b.clone(), FloatRect::new(0, 400, 320, 224)),
    ]);

    ctl.handle_pointer(PointerEvent::down(20, 4), &mut desk, &mut stack);
    assert!(ctl.handle_pointer(PointerEvent::down(420, 4), &mut desk, &mut stack));
    assert_eq!(ctl.captured_window(), Some(&a));
    assert_eq!(desk.window(&b).unwrap().interaction, Interaction::Idle);
    ctl.handle_pointer(PointerEvent::moved(36, 4), &mut desk, &mut stack);
    assert_eq!(desk.window(&a).unwrap().rect.left, 16);
    assert_eq!(desk.window(&b).unwrap().rect.left, 400);
}

#[test]
fn stacking_values_only_grow() {
    let ids = [
        ticker("AAPL"),
        ticker("MSFT"),
        WindowId::Utility(UtilityKind::Chat),
    ];
    let windows: Vec<(WindowId, FloatRect)> = ids
        .iter()
        .enumerate()
        .map(|(i, id)| (id.clone(), FloatRect::new(0, i as i32 * 400, 320, 224)))
        .collect();
    let (mut desk, mut stack, mut ctl) = desktop_with(&windows);

    let mut last = None;
    for round in 0..4 {
        for (i, id) in ids.iter().enumerate() {
            let z = if (round + i) % 2 == 0 {
                stack.activate(id, &mut desk).unwrap()
            } else {
                let x = i as i32 * 400 + 100;
                ctl.handle_pointer(PointerEvent::down(x, 100), &mut desk, &mut stack);
                ctl.handle_pointer(PointerEvent::up(x, 100), &mut desk, &mut stack);
                desk.window(id).unwrap().z_index.unwrap()
            };
            if let Some(prev) = last {
                assert!(z > prev);
            }
            last = Some(z);
            assert_eq!(stack.active(), Some(id));
            let topmost = desk.draw_order().last().map(|w| w.id.clone());
            assert_eq!(topmost.as_ref(), Some(id));
            assert_eq!(desk.draw_order().iter().filter(|w| w.active).count(), 1);
        }
    }

    // Closing the active window raises the next one and never rewinds the
    // counter.
    desk.destroy(&ids[2]);
    let promoted = stack.forget(&ids[2], &mut desk).unwrap();
    assert_eq!(stack.active(), Some(&promoted));
    assert_eq!(desk.draw_order().last().map(|w| w.id.clone()), Some(promoted));
    let z = stack.activate(&ids[0], &mut desk).unwrap();
    assert!(Some(z) > last);
    assert!(stack.activate(&ids[2], &mut desk).is_none());
}
