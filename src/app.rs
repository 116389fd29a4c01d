//! Application shell: wires settings, game, renderer and UI together.

use crate::game::{GameEvent, GameState, InputSnapshot};
use crate::render::{FrameBuffer, Renderer};
use crate::settings::Settings;
use crate::ui::{self, Hud};

use egui::{Key, RichText, TextureHandle, TextureOptions, ViewportCommand};

/// Game ticks per second.
const TICK_RATE: f64 = 60.0;
/// Catch-up cap so a stalled frame does not snowball.
const MAX_TICKS_PER_FRAME: u32 = 4;
const MESSAGE_SECONDS: f64 = 2.5;
const MINIMAP_SIZE: f32 = 180.0;

/// Which screen the application is currently showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AppScreen {
    MainMenu,
    Playing,
    GameOver,
}

/// One-shot inputs seen since the last tick.
#[derive(Debug, Default)]
struct PendingInput {
    use_door: bool,
    select_weapon: Option<usize>,
    mouse_dx: f32,
}

pub struct CrimsonApp {
    settings: Settings,
    screen: AppScreen,
    game: Option<GameState>,
    renderer: Option<Renderer>,
    frame: FrameBuffer,
    texture: Option<TextureHandle>,

    accumulator: f64,
    last_time: Option<f64>,
    pending: PendingInput,
    mouse_look: bool,
    show_minimap: bool,
    /// Status line and the time it was posted.
    message: Option<(String, f64)>,
    error: Option<String>,
}

impl Default for CrimsonApp {
    fn default() -> Self {
        Self::with_settings(Settings::default())
    }
}

impl CrimsonApp {
    /// Called once before the first frame.
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let stored = cc
            .storage
            .and_then(|storage| eframe::get_value::<Settings>(storage, eframe::APP_KEY));
        let settings = match stored {
            Some(settings) => match settings.validate() {
                Ok(()) => settings,
                Err(e) => {
                    log::warn!("Ignoring stored settings: {e}");
                    Settings::default()
                }
            },
            None => Settings::default(),
        };
        Self::with_settings(settings)
    }

    fn with_settings(settings: Settings) -> Self {
        let frame = FrameBuffer::new(settings.screen_width, settings.screen_height);
        Self {
            settings,
            screen: AppScreen::MainMenu,
            game: None,
            renderer: None,
            frame,
            texture: None,
            accumulator: 0.0,
            last_time: None,
            pending: PendingInput::default(),
            mouse_look: false,
            show_minimap: true,
            message: None,
            error: None,
        }
    }

    fn start_game(&mut self) {
        let seed = rand::random::<u64>();
        let started = GameState::new(self.settings.clone(), seed)
            .and_then(|game| Renderer::from_settings(&self.settings).map(|r| (game, r)));
        match started {
            Ok((game, renderer)) => {
                log::info!("New game, seed {seed:#018x}");
                self.frame
                    .resize(self.settings.screen_width, self.settings.screen_height);
                self.game = Some(game);
                self.renderer = Some(renderer);
                self.accumulator = 0.0;
                self.last_time = None;
                self.pending = PendingInput::default();
                self.message = None;
                self.error = None;
                self.screen = AppScreen::Playing;
            }
            Err(e) => {
                log::error!("Could not start a game: {e}");
                self.error = Some(e.to_string());
            }
        }
    }

    fn set_mouse_look(&mut self, ctx: &egui::Context, enabled: bool) {
        self.mouse_look = enabled;
        let grab = if enabled {
            egui::CursorGrab::Locked
        } else {
            egui::CursorGrab::None
        };
        ctx.send_viewport_cmd(ViewportCommand::CursorGrab(grab));
        ctx.send_viewport_cmd(ViewportCommand::CursorVisible(!enabled));
    }

    fn post(&mut self, text: String, now: f64) {
        self.message = Some((text, now));
    }
}

impl eframe::App for CrimsonApp {
    /// Called by the framework to save state before shutdown.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        eframe::set_value(storage, eframe::APP_KEY, &self.settings);
    }

    /// Called each time the UI needs repainting, which may be many times per second.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        match self.screen {
            AppScreen::MainMenu => self.show_main_menu(ctx),
            AppScreen::Playing => {
                // Keep ticking even without input.
                ctx.request_repaint();
                self.input(ctx);
                self.advance(ctx);
                self.play_screen(ctx);
            }
            AppScreen::GameOver => self.show_game_over(ctx),
        }
    }
}

// ---------------------------------------------------------------------------
// Menu screens
// ---------------------------------------------------------------------------

impl CrimsonApp {
    fn show_main_menu(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(50.0);

                ui.heading(
                    RichText::new("CRIMSON")
                        .size(40.0)
                        .color(egui::Color32::from_rgb(0xcc, 0x11, 0x11)),
                );

                ui.add_space(40.0);

                if self.game.as_ref().is_some_and(|g| g.running)
                    && ui.button(RichText::new("Resume").size(20.0)).clicked()
                {
                    self.last_time = None;
                    self.screen = AppScreen::Playing;
                }

                ui.add_space(10.0);

                if ui.button(RichText::new("New Game").size(20.0)).clicked() {
                    self.start_game();
                }

                ui.add_space(30.0);

                ui.label(RichText::new("Settings").size(16.0));
                ui.add_space(5.0);
                egui::Grid::new("settings").num_columns(2).show(ui, |ui| {
                    ui.label("Field of view");
                    ui.add(egui::Slider::new(&mut self.settings.fov, 0.6..=2.0).suffix(" rad"));
                    ui.end_row();

                    ui.label("Mouse sensitivity");
                    ui.add(
                        egui::Slider::new(&mut self.settings.mouse_sensitivity, 0.0005..=0.01)
                            .logarithmic(true),
                    );
                    ui.end_row();

                    ui.label("Rays");
                    ui.add(egui::Slider::new(&mut self.settings.ray_count, 80..=640));
                    ui.end_row();

                    ui.label("View distance");
                    ui.add(egui::Slider::new(&mut self.settings.max_depth, 8.0..=40.0));
                    ui.end_row();
                });

                if let Some(error) = &self.error {
                    ui.add_space(10.0);
                    ui.colored_label(egui::Color32::RED, error);
                }

                ui.add_space(30.0);
                ui.label("WASD / arrows: move and turn   Q/E: strafe   Space or click: fire");
                ui.label("F: use door   1/2: weapons   Tab: mouse look   M: map   Esc: menu");
            });
        });
    }

    fn show_game_over(&mut self, ctx: &egui::Context) {
        let summary = self
            .game
            .as_ref()
            .map(|g| (g.level.number, g.player.kills));
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(80.0);
                ui.heading(RichText::new("YOU DIED").size(40.0).color(egui::Color32::RED));
                ui.add_space(20.0);
                if let Some((level, kills)) = summary {
                    ui.label(RichText::new(format!("Level {level}, {kills} kills")).size(18.0));
                }
                ui.add_space(30.0);
                if ui.button(RichText::new("Try Again").size(20.0)).clicked() {
                    self.start_game();
                }
                ui.add_space(10.0);
                if ui.button(RichText::new("Main Menu").size(20.0)).clicked() {
                    self.screen = AppScreen::MainMenu;
                }
            });
        });
    }

    // -----------------------------------------------------------------------
    // Input
    // -----------------------------------------------------------------------

    /// Gather one-shot inputs; held keys are sampled per tick.
    fn input(&mut self, ctx: &egui::Context) {
        let mut toggle_look = false;
        let mut to_menu = false;
        ctx.input(|i| {
            if i.key_pressed(Key::F) {
                self.pending.use_door = true;
            }
            if i.key_pressed(Key::Num1) {
                self.pending.select_weapon = Some(0);
            }
            if i.key_pressed(Key::Num2) {
                self.pending.select_weapon = Some(1);
            }
            if i.key_pressed(Key::M) {
                self.show_minimap = !self.show_minimap;
            }
            toggle_look = i.key_pressed(Key::Tab);
            to_menu = i.key_pressed(Key::Escape);
            if self.mouse_look {
                self.pending.mouse_dx += i
                    .events
                    .iter()
                    .filter_map(|event| match event {
                        egui::Event::MouseMoved(delta) => Some(delta.x),
                        _ => None,
                    })
                    .sum::<f32>();
            }
        });
        if toggle_look {
            self.set_mouse_look(ctx, !self.mouse_look);
        }
        if to_menu {
            self.set_mouse_look(ctx, false);
            self.screen = AppScreen::MainMenu;
        }
    }

    fn held_input(ctx: &egui::Context) -> InputSnapshot {
        ctx.input(|i| InputSnapshot {
            forward: i.key_down(Key::W) || i.key_down(Key::ArrowUp),
            backward: i.key_down(Key::S) || i.key_down(Key::ArrowDown),
            strafe_left: i.key_down(Key::Q),
            strafe_right: i.key_down(Key::E),
            turn_left: i.key_down(Key::A) || i.key_down(Key::ArrowLeft),
            turn_right: i.key_down(Key::D) || i.key_down(Key::ArrowRight),
            fire: i.key_down(Key::Space) || i.pointer.primary_down(),
            ..InputSnapshot::default()
        })
    }

    /// Run as many fixed ticks as wall-clock time allows.
    fn advance(&mut self, ctx: &egui::Context) {
        let now = ctx.input(|i| i.time);
        let elapsed = self.last_time.map_or(0.0, |last| (now - last).max(0.0));
        self.last_time = Some(now);
        self.accumulator += elapsed;

        let step = 1.0 / TICK_RATE;
        let held = Self::held_input(ctx);
        let mut ticks = 0;
        while self.accumulator >= step && ticks < MAX_TICKS_PER_FRAME {
            let pending = std::mem::take(&mut self.pending);
            let input = InputSnapshot {
                use_door: pending.use_door,
                select_weapon: pending.select_weapon,
                mouse_dx: pending.mouse_dx,
                ..held
            };
            let Some(game) = self.game.as_mut() else {
                return;
            };
            let events = game.tick(&input);
            for event in events {
                self.on_event(ctx, event, now);
            }
            self.accumulator -= step;
            ticks += 1;
        }
        if ticks == MAX_TICKS_PER_FRAME {
            self.accumulator = 0.0;
        }
    }

    fn on_event(&mut self, ctx: &egui::Context, event: GameEvent, now: f64) {
        match event {
            GameEvent::DoorLocked { color } => {
                self.post(format!("You need the {} key", color.name()), now);
            }
            GameEvent::KeyCollected { color } => {
                self.post(format!("Picked up the {} key", color.name()), now);
            }
            GameEvent::PickupCollected { kind } => {
                self.post(format!("Picked up {kind:?}"), now);
            }
            GameEvent::LevelCompleted { level } => {
                self.post(format!("Level {level} complete"), now);
            }
            GameEvent::PlayerDied => {
                self.set_mouse_look(ctx, false);
                self.screen = AppScreen::GameOver;
            }
            GameEvent::WeaponFired { .. }
            | GameEvent::WeaponSwitched { .. }
            | GameEvent::EnemyHit { .. }
            | GameEvent::EnemyKilled { .. }
            | GameEvent::PlayerDamaged { .. }
            | GameEvent::DoorOpened { .. } => {}
        }
    }

    // -----------------------------------------------------------------------
    // Playing screen
    // -----------------------------------------------------------------------

    fn play_screen(&mut self, ctx: &egui::Context) {
        let (Some(game), Some(renderer)) = (self.game.as_ref(), self.renderer.as_mut()) else {
            self.screen = AppScreen::MainMenu;
            return;
        };

        renderer.render(&game.scene(), &mut self.frame);
        let image = ui::frame_image(&self.frame);
        let texture = match &mut self.texture {
            Some(texture) => {
                texture.set(image, TextureOptions::NEAREST);
                texture.clone()
            }
            None => {
                let texture = ctx.load_texture("view", image, TextureOptions::NEAREST);
                self.texture = Some(texture.clone());
                texture
            }
        };

        let hud = Hud::of(game);
        egui::TopBottomPanel::bottom("hud").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(
                    RichText::new(format!("HEALTH {}", hud.health))
                        .size(18.0)
                        .color(ui::health_color(hud.health)),
                );
                ui.separator();
                ui.label(RichText::new(format!("ARMOR {}", hud.armor)).size(18.0));
                ui.separator();
                ui.label(
                    RichText::new(format!("{} {}/{}", hud.weapon, hud.ammo, hud.max_ammo))
                        .size(18.0),
                );
                ui.separator();
                ui.label(RichText::new(format!("KILLS {}", hud.kills)).size(18.0));
                ui.separator();
                ui.label(RichText::new(format!("LEVEL {}", hud.level)).size(18.0));
                for color in &hud.keys {
                    ui.label(
                        RichText::new(format!("{} key", color.name()))
                            .size(18.0)
                            .color(ui::key_color(*color)),
                    );
                }
            });
        });

        let now = ctx.input(|i| i.time);
        let message = self
            .message
            .as_ref()
            .filter(|(_, posted)| now - posted < MESSAGE_SECONDS)
            .map(|(text, _)| text.clone());
        let show_minimap = self.show_minimap;

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE.fill(egui::Color32::BLACK))
            .show(ctx, |ui| {
                let available = ui.available_size();
                let aspect = self.frame.width() as f32 / self.frame.height().max(1) as f32;
                let size = if available.x / available.y > aspect {
                    egui::vec2(available.y * aspect, available.y)
                } else {
                    egui::vec2(available.x, available.x / aspect)
                };
                ui.centered_and_justified(|ui| {
                    ui.image((texture.id(), size));
                });

                let panel = ui.max_rect();
                if show_minimap {
                    let rect = egui::Rect::from_min_size(
                        panel.right_top() + egui::vec2(-MINIMAP_SIZE - 8.0, 8.0),
                        egui::vec2(MINIMAP_SIZE, MINIMAP_SIZE),
                    );
                    ui::paint_minimap(ui.painter(), rect, game);
                }
                if let Some(text) = message {
                    ui.painter().text(
                        panel.center_top() + egui::vec2(0.0, 24.0),
                        egui::Align2::CENTER_TOP,
                        text,
                        egui::FontId::proportional(20.0),
                        egui::Color32::WHITE,
                    );
                }
            });
    }
}
