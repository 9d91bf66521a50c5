use nova_blocks::{Block, BlockId, BlockRegistry};
use nova_chunk::SectionMap;
use nova_geom::{BlockBox, BlockPos, SECTION_SIZE};
use nova_gui::{GuiDrawBatcher, GuiScreen, IRect, ResourceLocation, WindowChrome, WindowTheme};

use crate::config::{ConfigError, SceneSection};

/// Ids of the blocks the demo world is built from.
#[derive(Clone, Copy, Debug)]
pub struct DemoBlocks {
    pub stone: BlockId,
    pub dirt: BlockId,
    pub grass: BlockId,
    pub glass: BlockId,
    pub water: BlockId,
    pub glowstone: BlockId,
}

impl DemoBlocks {
    pub fn resolve(reg: &BlockRegistry) -> Result<Self, ConfigError> {
        let id = |name: &str| {
            reg.id_by_name(name)
                .ok_or_else(|| ConfigError::MissingBlock(name.to_string()))
        };
        Ok(Self {
            stone: id("stone")?,
            dirt: id("dirt")?,
            grass: id("grass")?,
            glass: id("glass")?,
            water: id("water")?,
            glowstone: id("glowstone")?,
        })
    }
}

/// Column range in section coordinates. One extra column past `+radius` on x
/// so a camera shift has terrain to move onto.
pub fn column_range(radius: i32) -> (std::ops::RangeInclusive<i32>, std::ops::RangeInclusive<i32>) {
    (-radius..=radius + 1, -radius..=radius)
}

/// Layered ground with a glass row, a water pool, one damaged block and a glowstone lamp.
pub fn build_world(blocks: &DemoBlocks, scene: &SceneSection) -> SectionMap {
    let mut world = SectionMap::new();
    let (xs, zs) = column_range(scene.radius);
    let min_x = xs.start() * SECTION_SIZE;
    let max_x = (xs.end() + 1) * SECTION_SIZE - 1;
    let min_z = zs.start() * SECTION_SIZE;
    let max_z = (zs.end() + 1) * SECTION_SIZE - 1;
    let top_y = (scene.sections_y * SECTION_SIZE - 1).max(0);
    let gh = scene.ground_height.clamp(3, top_y.max(3));

    let slab = |y0: i32, y1: i32| BlockBox::new(BlockPos::new(min_x, y0, min_z), BlockPos::new(max_x, y1, max_z));
    world.fill(slab(0, gh - 4), Block::new(blocks.stone));
    world.fill(slab(gh - 3, gh - 2), Block::new(blocks.dirt));
    world.fill(slab(gh - 1, gh - 1), Block::new(blocks.grass));

    world.fill(
        BlockBox::new(BlockPos::new(-8, gh, 2), BlockPos::new(7, gh, 2)),
        Block::new(blocks.glass),
    );
    world.fill(
        BlockBox::new(BlockPos::new(3, gh - 2, -7), BlockPos::new(7, gh - 1, -3)),
        Block::new(blocks.water),
    );
    world.set_block(BlockPos::new(0, gh, 0), Block::new(blocks.stone).with_damage(3));
    world.set_block(BlockPos::new(-4, gh, -4), Block::new(blocks.glowstone));
    log::info!(
        "demo world: {} section(s), ground at y={}",
        world.len(),
        gh
    );
    world
}

/// Render chunk origins for the visible area, indexed in placement order.
pub fn chunk_origins(scene: &SceneSection) -> Vec<BlockPos> {
    let r = scene.radius;
    let mut out = Vec::new();
    for cz in -r..=r {
        for sy in 0..scene.sections_y.max(1) {
            for cx in -r..=r {
                out.push(BlockPos::new(cx * SECTION_SIZE, sy * SECTION_SIZE, cz * SECTION_SIZE));
            }
        }
    }
    out
}

/// The west-most column moved one step east of the view; returns `(index, new origin)`.
pub fn camera_shift(scene: &SceneSection, origins: &[BlockPos]) -> Vec<(usize, BlockPos)> {
    let west = -scene.radius * SECTION_SIZE;
    let step = (2 * scene.radius + 1) * SECTION_SIZE;
    origins
        .iter()
        .enumerate()
        .filter(|(_, o)| o.x == west)
        .map(|(i, o)| (i, o.offset(step, 0, 0)))
        .collect()
}

struct MenuButton {
    rect: IRect,
}

/// A centered window with a column of buttons; redraws on hover changes.
pub struct DemoMenu {
    theme: WindowTheme,
    frame: IRect,
    buttons: Vec<MenuButton>,
    background: ResourceLocation,
    hovered: Option<usize>,
    title_hovered: bool,
    dirty: bool,
}

impl DemoMenu {
    pub fn new(scaled_width: i32, scaled_height: i32) -> Self {
        let (w, h) = (220, 120);
        let frame = IRect::new((scaled_width - w) / 2, (scaled_height - h) / 2, w, h);
        let theme = WindowTheme::default();
        let buttons = (0..3)
            .map(|i| MenuButton {
                rect: IRect::new(frame.x + 10, frame.y + theme.titlebar_height + 8 + i * 26, w - 20, 20),
            })
            .collect();
        Self {
            theme,
            frame,
            buttons,
            background: ResourceLocation::from("textures/gui/options_background.png"),
            hovered: None,
            title_hovered: false,
            dirty: true,
        }
    }

    pub fn button_rect(&self, i: usize) -> Option<IRect> {
        self.buttons.get(i).map(|b| b.rect)
    }

    pub fn hovered(&self) -> Option<usize> {
        self.hovered
    }
}

impl GuiScreen for DemoMenu {
    fn check_state_changed(&mut self, mouse_x: i32, mouse_y: i32) -> bool {
        let hovered = self.buttons.iter().position(|b| b.rect.contains(mouse_x, mouse_y));
        let title = IRect::new(self.frame.x, self.frame.y, self.frame.w, self.theme.titlebar_height)
            .contains(mouse_x, mouse_y);
        if hovered != self.hovered || title != self.title_hovered {
            self.hovered = hovered;
            self.title_hovered = title;
            self.dirty = true;
        }
        std::mem::take(&mut self.dirty)
    }

    fn draw(&mut self, gui: &mut GuiDrawBatcher, _mouse_x: i32, _mouse_y: i32) {
        // tiled dirt backdrop behind the window
        gui.draw_modal_rect_with_custom_sized_texture(
            &self.background,
            self.frame.x - 16,
            self.frame.y - 16,
            0.0,
            0.0,
            self.frame.w + 32,
            self.frame.h + 32,
            32.0,
            32.0,
        );
        WindowChrome::draw_window(gui, &self.theme, self.frame, self.title_hovered);
        for (i, b) in self.buttons.iter().enumerate() {
            WindowChrome::draw_button(gui, &self.theme, b.rect, self.hovered == Some(i));
        }
    }
}
