mod app_dir;
mod cli;
mod driver;
mod preferences;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};

use iterview_core::{orbit_trace, Annotations, FunctionRegistry, IterationFunction, Space, Viewport};
use iterview_render::{
    export_png, overlay, parameter_preview, Colormap, ExportMetadata, Frame, RenderSession,
};

use cli::Cli;
use driver::Driver;
use preferences::{AppPreferences, LastView};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> iterview_render::Result<()> {
    let registry = FunctionRegistry::with_builtins();
    if cli.list {
        println!("functions: {}", registry.names().collect::<Vec<_>>().join(", "));
        println!("colormaps: {}", Colormap::catalog().join(", "));
        return Ok(());
    }

    info!("Starting iterview");
    let mut prefs = AppPreferences::load();
    apply_overrides(&mut prefs, &cli);

    let mut function = registry.create(&prefs.function, prefs.space)?;
    let last_view = prefs
        .last_view
        .as_ref()
        .filter(|v| prefs.restore_last_view && v.function == prefs.function && v.space == prefs.space);
    if let Some(view) = last_view {
        if let Err(e) = function.restore_args(&view.args) {
            warn!("Ignoring stored arguments: {e}");
            function.defaults();
        }
    }
    for (name, value) in &cli.args {
        function.set_arg(name, value)?;
    }

    let rect = cli
        .rect
        .or(last_view.map(|v| v.rect))
        .unwrap_or_else(|| function.default_range());
    let viewport = match cli.height {
        Some(h) => Viewport::new(rect, prefs.width, h)?,
        None => Viewport::with_columns(rect, prefs.width)?,
    };
    let colormap = Arc::new(load_colormap(&prefs.colormap)?);

    let mut driver = Driver::new(prefs.engine.clone())?;
    let mut outcome = driver.render(function, viewport, Arc::clone(&colormap))?;
    info!("{}", status_line(&outcome.session));

    for [px, py, pw, ph] in &cli.zoom {
        let zoomed = outcome.session.viewport.from_selection(*px as i32, *py as i32, *pw, *ph)?;
        let viewport = Viewport::with_columns(zoomed, prefs.width)?;
        info!(rect = %zoomed, "Zooming");
        let function = outcome.function;
        driver.history.push(outcome.session);
        outcome = driver.render(function, viewport, Arc::clone(&colormap))?;
        info!("{}", status_line(&outcome.session));
    }

    let mut function = outcome.function;
    let mut session = outcome.session;
    let mut frame = outcome.frame;
    for _ in 0..cli.back {
        let Some(previous) = driver.history.pop() else {
            warn!("History is empty; staying on the current view");
            break;
        };
        previous.restore_args(function.as_mut())?;
        frame = previous.present();
        session = previous;
        info!(rect = %session.viewport.rect, "Restored previous view");
    }

    if let Some(start) = cli.orbit {
        let mut notes = Annotations::default();
        let segments = orbit_trace(function.as_ref(), start, cli.orbit_steps, &mut notes);
        info!(segments, "Orbit of {start}");
        overlay::burn(&mut frame, &notes.resolved(&session.viewport));
    }

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output(&session));
    write_png(&frame, &output, &ExportMetadata::from_session(&session))?;

    if let Some(parameter) = cli.preview.filter(|_| session.space == Space::Parameter) {
        match registry.create(session.function_name.as_str(), Space::Dynamical) {
            Ok(mut companion) => {
                if let Err(e) = companion.restore_args(&session.args) {
                    warn!("Preview uses default arguments: {e}");
                }
                let thumb = parameter_preview(
                    companion.as_mut(),
                    parameter,
                    prefs.preview_size,
                    &colormap,
                )?;
                let mut meta = ExportMetadata::from_session(&session);
                meta.space = companion.space().to_string();
                meta.rect = companion.default_range().to_string();
                let path = output.with_file_name(format!(
                    "{}-preview.png",
                    output.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default()
                ));
                write_png(&thumb, &path, &meta)?;
            }
            Err(e) => warn!("No preview: {e}"),
        }
    }

    if cli.preview.is_some() && session.space != Space::Parameter {
        warn!("Previews are drawn for parameter-space renders only");
    }

    if cli.save_prefs {
        prefs.last_view = Some(LastView {
            function: session.function_name.clone(),
            space: session.space,
            rect: session.viewport.rect,
            args: function.arg_map(),
        });
        prefs.save();
    }
    Ok(())
}

fn apply_overrides(prefs: &mut AppPreferences, cli: &Cli) {
    if let Some(f) = &cli.function {
        prefs.function = f.clone();
    }
    if let Some(space) = cli.space {
        prefs.space = space;
    }
    if let Some(w) = cli.width {
        prefs.width = w;
    }
    if let Some(c) = &cli.colormap {
        prefs.colormap = c.clone();
    }
    if let Some(t) = cli.threads {
        prefs.engine.threads = Some(t);
    }
    prefs.engine.single_threaded |= cli.single_threaded;
    prefs.engine.sandbox |= cli.sandbox;
    prefs.engine.annotate |= cli.annotate;
}

/// A formula or `grayscale` by name, else a table file, looked up as given
/// and then in the colormaps directory.
fn load_colormap(name: &str) -> iterview_render::Result<Colormap> {
    if let Ok(cm) = Colormap::by_name(name) {
        return Ok(cm);
    }
    let path = Path::new(name);
    if path.exists() {
        return Colormap::load(path);
    }
    let bundled = app_dir::colormaps_directory().join(name);
    if bundled.exists() {
        return Colormap::load(&bundled);
    }
    Colormap::by_name(name)
}

fn status_line(session: &RenderSession) -> String {
    format!(
        "{} ({} space) {}x{} over {} in {} ms",
        session.function_name,
        session.space,
        session.viewport.width,
        session.viewport.height,
        session.viewport.rect,
        session.elapsed.as_millis()
    )
}

fn default_output(session: &RenderSession) -> PathBuf {
    app_dir::images_directory().join(format!("{}-{}.png", session.function_name, session.space))
}

fn write_png(
    frame: &Frame,
    path: &Path,
    meta: &ExportMetadata,
) -> iterview_render::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    export_png(frame, path, meta)?;
    info!("Wrote {}", path.display());
    Ok(())
}
