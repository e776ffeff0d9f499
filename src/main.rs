//! Glowspire entry point
//!
//! Handles platform-specific initialization and runs the frame loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_app {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{CanvasRenderingContext2d, HtmlAudioElement, HtmlCanvasElement, ImageData};

    use glowspire::Viewport;
    use glowspire::renderer::{
        GpuParticles, ParticleRenderer, RenderError, RenderInitError, SoftwareParticles,
        SoftwareRenderer,
    };
    use glowspire::settings::{BackendPreference, Settings};
    use glowspire::sim::{SceneEvent, SceneState};

    /// Everything the frame loop touches.
    ///
    /// Two stacked canvases: the 2D scene canvas below, the particle overlay
    /// above it, so sparkles read over the helix stroke.
    struct App {
        scene: SceneState,
        scene_renderer: SoftwareRenderer,
        particles: Box<dyn ParticleRenderer>,
        ctx: CanvasRenderingContext2d,
        scene_canvas: HtmlCanvasElement,
        overlay_canvas: HtmlCanvasElement,
    }

    impl App {
        fn resize_to(&mut self, width: u32, height: u32) {
            self.scene_canvas.set_width(width);
            self.scene_canvas.set_height(height);
            self.overlay_canvas.set_width(width);
            self.overlay_canvas.set_height(height);

            let viewport = Viewport::new(width as f32, height as f32);
            self.scene.resize(viewport);
            if let Err(e) = self.scene_renderer.resize(viewport) {
                log::warn!("Scene resize failed: {e}");
            }
            if let Err(e) = self.particles.resize(viewport) {
                log::warn!("Particle resize failed: {e}");
            }
        }

        fn frame(&mut self, time: f64) {
            if let Some(SceneEvent::GrowthComplete) = self.scene.tick(time) {
                log::info!("Growth complete");
                schedule_touch_hint();
            }

            match self
                .particles
                .draw(self.scene.snow(), self.scene.sparkles(), time)
            {
                Ok(()) => {}
                Err(RenderError::Surface(wgpu::SurfaceError::Lost)) => {
                    let viewport = self.scene.viewport();
                    if let Err(e) = self.particles.resize(viewport) {
                        log::warn!("Surface reacquire failed: {e}");
                    }
                }
                Err(RenderError::Surface(wgpu::SurfaceError::OutOfMemory)) => {
                    log::error!("Out of memory!");
                }
                Err(e) => log::warn!("Particle draw error: {e}"),
            }

            self.scene_renderer
                .render(&self.scene, time, self.particles.overlay());

            let pixmap = self.scene_renderer.pixmap();
            match ImageData::new_with_u8_clamped_array_and_sh(
                Clamped(pixmap.data()),
                pixmap.width(),
                pixmap.height(),
            ) {
                Ok(image) => {
                    let _ = self.ctx.put_image_data(&image, 0.0, 0.0);
                }
                Err(e) => log::warn!("ImageData blit failed: {e:?}"),
            }
        }
    }

    async fn try_gpu(
        canvas: &HtmlCanvasElement,
        width: u32,
        height: u32,
    ) -> Result<GpuParticles, RenderInitError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU,
            ..Default::default()
        });

        let surface = instance.create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        GpuParticles::new(surface, &adapter, width, height).await
    }

    async fn create_particles(
        canvas: &HtmlCanvasElement,
        width: u32,
        height: u32,
        backend: BackendPreference,
    ) -> Box<dyn ParticleRenderer> {
        if backend == BackendPreference::Auto {
            match try_gpu(canvas, width, height).await {
                Ok(gpu) => {
                    log::info!("Particle backend: WebGPU");
                    return Box::new(gpu);
                }
                Err(e) => log::warn!("WebGPU unavailable, falling back to software: {e}"),
            }
        }

        log::info!("Particle backend: software");
        let viewport = Viewport::new(width as f32, height as f32);
        Box::new(SoftwareParticles::new(viewport).expect("pixmap allocation"))
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Glowspire starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        // Hide loading indicator
        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let scene_canvas: HtmlCanvasElement = document
            .get_element_by_id("scene-canvas")
            .expect("no scene canvas")
            .dyn_into()
            .expect("not a canvas");
        let overlay_canvas: HtmlCanvasElement = document
            .get_element_by_id("particle-canvas")
            .expect("no particle canvas")
            .dyn_into()
            .expect("not a canvas");

        // Physical pixels on both canvases
        let dpr = window.device_pixel_ratio();
        let width = (scene_canvas.client_width() as f64 * dpr) as u32;
        let height = (scene_canvas.client_height() as f64 * dpr) as u32;
        scene_canvas.set_width(width);
        scene_canvas.set_height(height);
        overlay_canvas.set_width(width);
        overlay_canvas.set_height(height);

        let ctx: CanvasRenderingContext2d = scene_canvas
            .get_context("2d")
            .ok()
            .flatten()
            .expect("no 2d context")
            .dyn_into()
            .expect("not a 2d context");

        let settings = Settings::load();
        let viewport = Viewport::new(width as f32, height as f32);
        let seed = js_sys::Date::now() as u64;

        let scene = SceneState::new(seed, viewport, settings.density_scale());
        let scene_renderer =
            SoftwareRenderer::new(viewport, seed ^ 0x9e3779b9, settings.effective_glitter())
                .expect("pixmap allocation");
        let particles = create_particles(&overlay_canvas, width, height, settings.backend).await;

        log::info!("Scene initialized with seed {seed} at {width}x{height}");

        setup_start_overlay(&document, settings.music_volume);

        let app = Rc::new(RefCell::new(App {
            scene,
            scene_renderer,
            particles,
            ctx,
            scene_canvas,
            overlay_canvas,
        }));

        setup_resize_listener(app.clone());

        // Start frame loop
        request_animation_frame(app);

        log::info!("Glowspire running!");
    }

    /// First tap starts the music (autoplay policy) and drops the overlay
    fn setup_start_overlay(document: &web_sys::Document, music_volume: f32) {
        let Some(overlay) = document.get_element_by_id("start-overlay") else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };
            if let Some(audio) = document
                .get_element_by_id("bg-music")
                .and_then(|el| el.dyn_into::<HtmlAudioElement>().ok())
            {
                audio.set_volume(music_volume as f64);
                let _ = audio.play();
            }
            if let Some(el) = document.get_element_by_id("start-overlay") {
                let _ = el.set_attribute("class", "hidden");
            }
        });
        let _ = overlay.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_resize_listener(app: Rc<RefCell<App>>) {
        let window = web_sys::window().expect("no window");
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let Some(window) = web_sys::window() else {
                return;
            };
            let dpr = window.device_pixel_ratio();
            let mut app = app.borrow_mut();
            let width = (app.scene_canvas.client_width() as f64 * dpr) as u32;
            let height = (app.scene_canvas.client_height() as f64 * dpr) as u32;
            if width == 0 || height == 0 {
                return;
            }
            app.resize_to(width, height);
            log::info!("Resized to {width}x{height}");
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    /// Reveal the interaction hint shortly after the helix finishes
    fn schedule_touch_hint() {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move || {
            if let Some(document) = web_sys::window().and_then(|w| w.document()) {
                if let Some(el) = document.get_element_by_id("touch-hint") {
                    let _ = el.set_attribute("class", "");
                }
            }
        });
        let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(
            closure.as_ref().unchecked_ref(),
            350,
        );
        closure.forget();
    }

    fn request_animation_frame(app: Rc<RefCell<App>>) {
        let window = web_sys::window().expect("no window");
        let closure = Closure::once(move |time: f64| {
            frame_loop(app, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn frame_loop(app: Rc<RefCell<App>>, time: f64) {
        app.borrow_mut().frame(time);
        request_animation_frame(app);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_app::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use std::time::{SystemTime, UNIX_EPOCH};

    use glowspire::Viewport;
    use glowspire::renderer::{ParticleRenderer, SoftwareParticles, SoftwareRenderer};
    use glowspire::settings::Settings;
    use glowspire::sim::{SceneEvent, SceneState};

    env_logger::init();
    log::info!("Glowspire (native) starting...");

    let settings = Settings::load();
    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);

    let viewport = Viewport::new(800.0, 600.0);
    let mut scene = SceneState::new(seed, viewport, settings.density_scale());
    let mut renderer =
        match SoftwareRenderer::new(viewport, seed ^ 0x9e3779b9, settings.effective_glitter()) {
            Ok(r) => r,
            Err(e) => {
                log::error!("Renderer init failed: {e}");
                return;
            }
        };
    let mut particles = match SoftwareParticles::new(viewport) {
        Ok(p) => p,
        Err(e) => {
            log::error!("Particle init failed: {e}");
            return;
        }
    };

    log::info!("Seed {seed}, {} flakes", scene.snow().total());

    // Drive a bit over five seconds of frames, enough to cross the growth window
    for frame in 0..320u32 {
        let time = frame as f64 * 16.0;
        if let Some(SceneEvent::GrowthComplete) = scene.tick(time) {
            log::info!("Growth complete at frame {frame}");
        }
        if let Err(e) = particles.draw(scene.snow(), scene.sparkles(), time) {
            log::warn!("Particle draw error: {e}");
        }
        renderer.render(&scene, time, particles.overlay());
        if frame % 60 == 0 {
            log::info!(
                "frame {frame}: t={:.3}, {} polyline points",
                scene.growth().t(),
                scene.growth().points().len()
            );
        }
    }

    log::info!("Done");
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
