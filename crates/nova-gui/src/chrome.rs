use crate::atlas::ResourceLocation;
use crate::batch::GuiDrawBatcher;
use crate::color::Rgb;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IRect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl IRect {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    #[inline]
    pub fn contains(&self, px: i32, py: i32) -> bool {
        px >= self.x && px < self.x + self.w && py >= self.y && py < self.y + self.h
    }

    #[inline]
    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    #[inline]
    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }
}

/// Colors are `0xAARRGGBB`.
#[derive(Clone, Debug)]
pub struct WindowTheme {
    pub titlebar_height: i32,
    pub shadow_offset: i32,
    pub frame_color: u32,
    pub frame_shadow: u32,
    pub title_top: u32,
    pub title_bottom: u32,
    pub title_hover_top: u32,
    pub title_hover_bottom: u32,
    pub body_color: u32,
    pub outline: u32,
    pub button_normal: u32,
    pub button_hover: u32,
    pub button_sprite: ResourceLocation,
}

impl Default for WindowTheme {
    fn default() -> Self {
        Self {
            titlebar_height: 14,
            shadow_offset: 3,
            frame_color: 0xFF2B2F36,
            frame_shadow: 0xFF0B0C0F,
            title_top: 0xFF3F5A88,
            title_bottom: 0xFF2C4166,
            title_hover_top: 0xFF5275B0,
            title_hover_bottom: 0xFF39548A,
            body_color: 0xFF1D2026,
            outline: 0xFF4A505C,
            button_normal: 0xFF505864,
            button_hover: 0xFF8FA3C8,
            button_sprite: ResourceLocation::from("textures/gui/widgets.png"),
        }
    }
}

fn argb(c: Rgb) -> u32 {
    let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u32;
    0xFF00_0000 | q(c.r) << 16 | q(c.g) << 8 | q(c.b)
}

pub struct WindowChrome;

impl WindowChrome {
    /// Shadow, frame, title gradient, body and a one-pixel outline.
    pub fn draw_window(gui: &mut GuiDrawBatcher, theme: &WindowTheme, frame: IRect, hovered_title: bool) {
        let IRect { x, y, w, h } = frame;
        let s = theme.shadow_offset;
        gui.draw_rect(x + s, y + s, x + w + s, y + h + s, theme.frame_shadow);
        gui.draw_rect(x, y, x + w, y + h, theme.frame_color);
        let (top, bottom) = if hovered_title {
            (theme.title_hover_top, theme.title_hover_bottom)
        } else {
            (theme.title_top, theme.title_bottom)
        };
        let title_h = theme.titlebar_height.min(h);
        gui.draw_gradient_rect(x, y, x + w, y + title_h, top, bottom);
        if h > theme.titlebar_height {
            gui.draw_rect(x + 1, y + title_h, x + w - 1, y + h - 1, theme.body_color);
        }
        Self::draw_outline(gui, frame, theme.outline);
    }

    pub fn draw_outline(gui: &mut GuiDrawBatcher, r: IRect, color: u32) {
        gui.draw_rect(r.x, r.y, r.right(), r.y + 1, color);
        gui.draw_rect(r.x, r.bottom() - 1, r.right(), r.bottom(), color);
        gui.draw_rect(r.x, r.y, r.x + 1, r.bottom(), color);
        gui.draw_rect(r.right() - 1, r.y, r.right(), r.bottom(), color);
    }

    /// Legacy 200×20 button sprite from the widgets sheet plus a tinted hover overlay.
    pub fn draw_button(gui: &mut GuiDrawBatcher, theme: &WindowTheme, rect: IRect, hovered: bool) {
        let sprite_row = if hovered { 86 } else { 66 };
        let half = rect.w / 2;
        gui.draw_textured_modal_rect(&theme.button_sprite, rect.x, rect.y, 0, sprite_row, half, rect.h);
        gui.draw_textured_modal_rect(
            &theme.button_sprite,
            rect.x + half,
            rect.y,
            200 - (rect.w - half),
            sprite_row,
            rect.w - half,
            rect.h,
        );
        if hovered {
            let tint = Rgb::from_argb(theme.button_normal).blend(Rgb::from_argb(theme.button_hover), 0.6);
            Self::draw_outline(gui, rect, argb(tint));
        }
    }
}
