use nova_gui::{
    AtlasResolver, FLOATS_PER_VERTEX, FrameContext, GuiDrawBatcher, GuiScreen, ResourceLocation,
    nova_draw_screen,
};
use nova_sink::{RecordingSink, SinkCall, TextureAtlas};
use proptest::prelude::*;

fn resolver() -> AtlasResolver {
    let mut r = AtlasResolver::new("nova:white".into());
    r.register(TextureAtlas::Gui, ["gui/widgets"]);
    r
}

fn ctx(resolver: &AtlasResolver) -> FrameContext<'_> {
    FrameContext {
        display_width: 1708,
        display_height: 960,
        scaled_width: 854,
        scaled_height: 480,
        raw_mouse_x: 200,
        raw_mouse_y: 100,
        resolver,
    }
}

/// Redraws only when told to, drawing one rectangle into two textures.
struct ToggleScreen {
    dirty: bool,
    draws: usize,
}

impl GuiScreen for ToggleScreen {
    fn check_state_changed(&mut self, _mx: i32, _my: i32) -> bool {
        std::mem::take(&mut self.dirty)
    }

    fn draw(&mut self, gui: &mut GuiDrawBatcher, _mx: i32, _my: i32) {
        self.draws += 1;
        let tex = ResourceLocation::from("textures/gui/widgets.png");
        gui.draw_rectangle(&tex, 10.0, 20.0, 0.5, 5.0, 5.0, 0.0, 0.0, 1.0, 1.0);
        gui.draw_rect(0, 0, 4, 4, 0xFFFFFFFF);
    }
}

#[test]
fn unchanged_screen_sends_nothing() {
    let r = resolver();
    let sink = RecordingSink::new();
    let mut gui = GuiDrawBatcher::new(r.white_texture().clone());
    let mut screen = ToggleScreen { dirty: true, draws: 0 };
    let first = nova_draw_screen(&mut gui, &mut screen, &ctx(&r), &sink);
    assert!(first.redrawn);
    assert_eq!(first.commands, 2);
    let sent = sink.take();
    assert_eq!(sent.len(), 3);
    assert_eq!(sent[0], SinkCall::ClearGui);

    let second = nova_draw_screen(&mut gui, &mut screen, &ctx(&r), &sink);
    assert!(!second.redrawn);
    assert!(sink.is_empty());
    assert_eq!(screen.draws, 1);
}

#[test]
fn flushed_commands_carry_atlas_and_geometry() {
    let r = resolver();
    let sink = RecordingSink::new();
    let mut gui = GuiDrawBatcher::new(r.white_texture().clone());
    let mut screen = ToggleScreen { dirty: true, draws: 0 };
    nova_draw_screen(&mut gui, &mut screen, &ctx(&r), &sink);
    let cmds = sink.gui_commands();
    let widgets = cmds
        .iter()
        .find(|c| c.texture_name == "textures/gui/widgets.png")
        .unwrap();
    assert_eq!(widgets.texture_atlas, TextureAtlas::Gui);
    assert_eq!(widgets.index_buffer_size(), 6);
    assert_eq!(widgets.vertex_buffer_size(), 4 * FLOATS_PER_VERTEX);
    let pos: Vec<(f32, f32)> = widgets
        .vertex_buffer
        .chunks(FLOATS_PER_VERTEX)
        .map(|v| (v[0], v[1]))
        .collect();
    assert_eq!(pos, vec![(10.0, 20.0), (15.0, 20.0), (10.0, 25.0), (15.0, 25.0)]);
    let white = cmds.iter().find(|c| c.texture_name == "white").unwrap();
    assert_eq!(white.texture_atlas, TextureAtlas::Gui);
    assert!(gui.is_empty());
}

#[test]
fn texture_name_omits_namespace() {
    let r = resolver();
    let sink = RecordingSink::new();
    let mut gui = GuiDrawBatcher::new(r.white_texture().clone());
    gui.draw(&"mod:textures/custom.png".into(), &[0, 1, 2], &[0.0; 3 * FLOATS_PER_VERTEX]);
    let listed = gui.commands(&r);
    assert_eq!(listed[0].texture_name, "textures/custom.png");
    gui.flush(&sink, &r);
    let cmds = sink.gui_commands();
    assert_eq!(cmds.len(), 1);
    assert_eq!(cmds[0].texture_name, "textures/custom.png");
}

#[test]
fn unknown_texture_degrades_to_no_atlas() {
    let r = resolver();
    let sink = RecordingSink::new();
    let mut gui = GuiDrawBatcher::new(r.white_texture().clone());
    gui.draw(&"mod:textures/custom.png".into(), &[0, 1, 2], &[0.0; 3 * FLOATS_PER_VERTEX]);
    assert_eq!(gui.flush(&sink, &r), 1);
    assert_eq!(sink.gui_commands()[0].texture_atlas, TextureAtlas::None);
}

#[test]
fn mouse_is_scaled_and_flipped() {
    let r = resolver();
    let c = ctx(&r);
    // 200 * 854 / 1708 = 100; 480 - 100 * 480 / 960 - 1 = 429
    assert_eq!(c.mouse(), (100, 429));
}

proptest! {
    #[test]
    fn indices_are_rebased_by_existing_vertices(existing in 0usize..50, extra in 3usize..10) {
        let tex = ResourceLocation::from("textures/gui/icons.png");
        let mut gui = GuiDrawBatcher::new("nova:white".into());
        if existing > 0 {
            let idx: Vec<u32> = (0..existing as u32).collect();
            gui.draw(&tex, &idx, &vec![0.0; existing * FLOATS_PER_VERTEX]);
        }
        let before = gui.batch(&tex).map(|b| b.indices.len()).unwrap_or(0);
        gui.draw(&tex, &[0, 1, 2], &vec![1.0; extra * FLOATS_PER_VERTEX]);
        let b = gui.batch(&tex).unwrap();
        let v = existing as u32;
        prop_assert_eq!(&b.indices[before..], &[v, v + 1, v + 2]);
        prop_assert_eq!(b.vertex_count(), existing + extra);
    }

    #[test]
    fn per_texture_batches_stay_separate(n_a in 1usize..10, n_b in 1usize..10) {
        let a = ResourceLocation::from("textures/gui/a.png");
        let b = ResourceLocation::from("textures/gui/b.png");
        let mut gui = GuiDrawBatcher::new("nova:white".into());
        for i in 0..n_a.max(n_b) {
            if i < n_a {
                gui.draw_rectangle(&a, 0.0, 0.0, 0.5, 1.0, 1.0, 0.0, 0.0, 1.0, 1.0);
            }
            if i < n_b {
                gui.draw_rectangle(&b, 0.0, 0.0, 0.5, 1.0, 1.0, 0.0, 0.0, 1.0, 1.0);
            }
        }
        let ba = gui.batch(&a).unwrap();
        prop_assert_eq!(ba.vertex_count(), n_a * 4);
        prop_assert_eq!(*ba.indices.iter().max().unwrap() as usize, n_a * 4 - 1);
        prop_assert_eq!(gui.batch(&b).unwrap().indices.len(), n_b * 6);
    }
}
