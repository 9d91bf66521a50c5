use nova_sink::NativeSink;

use crate::atlas::AtlasResolver;
use crate::batch::GuiDrawBatcher;

/// A screen that draws through the batcher.
pub trait GuiScreen {
    /// Whether anything visible changed since the last call; consumes the change.
    fn check_state_changed(&mut self, mouse_x: i32, mouse_y: i32) -> bool;
    fn draw(&mut self, gui: &mut GuiDrawBatcher, mouse_x: i32, mouse_y: i32);
}

/// Per-frame inputs owned by the caller.
#[derive(Clone, Copy, Debug)]
pub struct FrameContext<'a> {
    pub display_width: i32,
    pub display_height: i32,
    pub scaled_width: i32,
    pub scaled_height: i32,
    /// Raw mouse position in display pixels, origin bottom-left.
    pub raw_mouse_x: i32,
    pub raw_mouse_y: i32,
    pub resolver: &'a AtlasResolver,
}

impl FrameContext<'_> {
    /// Mouse in scaled screen coordinates with the origin at the top-left.
    pub fn mouse(&self) -> (i32, i32) {
        let dw = self.display_width.max(1);
        let dh = self.display_height.max(1);
        let x = self.raw_mouse_x * self.scaled_width / dw;
        let y = self.scaled_height - self.raw_mouse_y * self.scaled_height / dh - 1;
        (x, y)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameReport {
    pub redrawn: bool,
    pub commands: usize,
    pub mouse: (i32, i32),
}

/// Redraws `screen` only when it reports a change: clears native GUI buffers,
/// re-collects every draw, and sends one command per texture.
pub fn nova_draw_screen(
    gui: &mut GuiDrawBatcher,
    screen: &mut dyn GuiScreen,
    ctx: &FrameContext<'_>,
    sink: &dyn NativeSink,
) -> FrameReport {
    let mouse = ctx.mouse();
    if !screen.check_state_changed(mouse.0, mouse.1) {
        return FrameReport {
            redrawn: false,
            commands: 0,
            mouse,
        };
    }
    gui.clear();
    sink.clear_gui_buffers();
    screen.draw(gui, mouse.0, mouse.1);
    let commands = gui.flush(sink, ctx.resolver);
    log::debug!(
        "gui redraw: {} command(s), mouse=({}, {})",
        commands,
        mouse.0,
        mouse.1
    );
    FrameReport {
        redrawn: true,
        commands,
        mouse,
    }
}
