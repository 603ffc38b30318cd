//! Video builder: still images to a video-only Matroska file.
//!
//! Pictures and transitions are numbered with the slot scheme from
//! [`crate::models::slots`]; the final concatenation relies on nothing but a
//! sort of the movie file names.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

use chrono::{Datelike, Local, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::commands::{ffmpeg, imagemagick, OptionFileBuilder, TextStyle};
use crate::models::slots::{self, SlotPlan, FIRST_SLOT};
use crate::models::{Profile, ProfileName, TagMetadata, UnitKind};
use crate::pipeline::{
    Pipeline, PipelineError, PipelineResult, ProgressObserver, StepError, StepResult,
};
use crate::tools::DEFAULT_FONT;
use crate::workspace::Workspace;

use super::Toolbox;

/// Fewest source pictures a show can be built from (the title collage
/// needs four).
pub const MIN_PICTURES: usize = 4;

const COLLAGE_SIZE: usize = 4;

/// Parameters of the video part of a show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoOptions {
    pub profile: Profile,
    /// Seconds each picture is shown.
    pub image_duration: u32,
    /// Seconds each morph transition lasts.
    pub transition_duration: u32,
    pub font: String,
    pub title: String,
    pub author: String,
    pub epilog: String,
    pub background: String,
    pub textcolor: String,
    /// Delete pictures and morph frames once their clip is rendered.
    pub remove_tempfiles: bool,
}

impl Default for VideoOptions {
    fn default() -> Self {
        Self {
            profile: ProfileName::default().profile(),
            image_duration: 5,
            transition_duration: 1,
            font: DEFAULT_FONT.to_string(),
            title: String::new(),
            author: String::new(),
            epilog: String::new(),
            background: "black".to_string(),
            textcolor: "white".to_string(),
            remove_tempfiles: true,
        }
    }
}

impl VideoOptions {
    fn text_style(&self) -> TextStyle {
        TextStyle {
            font: self.font.clone(),
            pointsize: self.profile.fontsize,
            fill: self.textcolor.clone(),
            background: self.background.clone(),
        }
    }
}

#[derive(Debug)]
struct VideoDirs {
    pictures: PathBuf,
    animations: PathBuf,
    movies: PathBuf,
}

/// Builds the video-only container of a show.
pub struct VideoBuilder {
    sources: Vec<PathBuf>,
    options: VideoOptions,
    toolbox: Toolbox,
    workspace: Workspace,
    dirs: VideoDirs,
    /// Normalized source pictures, in slot order.
    pictures: Vec<PathBuf>,
    first: Option<PathBuf>,
    last: Option<PathBuf>,
    rng: StdRng,
    today: NaiveDate,
    output: Option<PathBuf>,
}

impl VideoBuilder {
    /// Create the builder and its workspace under `workdir`.
    pub fn new(
        sources: Vec<PathBuf>,
        options: VideoOptions,
        toolbox: Toolbox,
        workdir: Option<&Path>,
    ) -> PipelineResult<Self> {
        let unit = UnitKind::Video.name();
        let setup = |e: std::io::Error| PipelineError::setup_failed(unit, e.to_string());

        let workspace = Workspace::create(workdir, UnitKind::Video).map_err(setup)?;
        let dirs = VideoDirs {
            pictures: workspace.subdir("pictures").map_err(setup)?,
            animations: workspace.subdir("animation_pictures").map_err(setup)?,
            movies: workspace.subdir("movies").map_err(setup)?,
        };

        Ok(Self {
            sources,
            options,
            toolbox,
            workspace,
            dirs,
            pictures: Vec::new(),
            first: None,
            last: None,
            rng: StdRng::from_os_rng(),
            today: Local::now().date_naive(),
            output: None,
        })
    }

    /// Use `rng` for the title collage selection.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    /// Date used for the credit line and the release tag.
    pub fn with_date(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn into_workspace(self) -> Workspace {
        self.workspace
    }

    /// The video-only container, once built.
    pub fn output(&self) -> Option<&Path> {
        self.output.as_deref()
    }

    /// The fixed stage order.
    pub fn pipeline() -> Pipeline<Self> {
        Pipeline::new(UnitKind::Video.name())
            .with_stage("Copied source files to workdir", Self::copy_source_files)
            .with_stage("Created first picture with fade-in", Self::create_first_picture)
            .with_stage("Created last picture with fade-out", Self::create_last_picture)
            .with_stage("Resized pictures according to profile", Self::resize_pictures)
            .with_stage("Created animation pictures", Self::create_anim_pictures)
            .with_stage("Created small movies", Self::create_movies)
            .with_stage("Created video only MKV file", Self::create_video_only_mkv)
    }

    /// Run every stage and return the video-only container.
    ///
    /// Fails before any tool runs when fewer than four sources are given.
    pub fn build(&mut self, observer: &dyn ProgressObserver) -> PipelineResult<PathBuf> {
        self.validate()?;

        let pipeline = Self::pipeline();
        let elapsed = pipeline
            .run(self)
            .finish_with(|report| observer.stage_finished(UnitKind::Video, report))?;
        observer.unit_finished(UnitKind::Video, elapsed);

        self.output.clone().ok_or_else(|| {
            PipelineError::step_failed(
                UnitKind::Video.name(),
                "Created video only MKV file",
                StepError::other("no video file was produced"),
            )
        })
    }

    fn validate(&self) -> PipelineResult<()> {
        let unit = UnitKind::Video.name();
        if self.sources.len() < MIN_PICTURES {
            return Err(PipelineError::validation_failed(
                unit,
                format!(
                    "You must at least have {} pictures in your show (got {})",
                    MIN_PICTURES,
                    self.sources.len()
                ),
            ));
        }
        if let Some(missing) = self.sources.iter().find(|s| !s.is_file()) {
            return Err(PipelineError::validation_failed(
                unit,
                format!("Source picture not found: {}", missing.display()),
            ));
        }
        Ok(())
    }

    fn copy_source_files(&mut self) -> StepResult<()> {
        self.pictures.clear();
        for (index, src) in self.sources.iter().enumerate() {
            let slot = slots::source_slot(index);
            let dest = self.dirs.pictures.join(slots::picture_file_name(slot));
            self.toolbox
                .run(&imagemagick::auto_orient(&self.toolbox.executables, src, &dest))?;
            self.pictures.push(dest);
        }
        Ok(())
    }

    fn create_first_picture(&mut self) -> StepResult<()> {
        if self.pictures.len() < MIN_PICTURES {
            return Err(StepError::precondition_failed(format!(
                "title collage needs {} pictures, have {}",
                MIN_PICTURES,
                self.pictures.len()
            )));
        }

        let picks: Vec<PathBuf> = sample_indices(&mut self.rng, self.pictures.len())
            .into_iter()
            .map(|i| self.pictures[i].clone())
            .collect();
        tracing::debug!("Title collage from {:?}", picks);

        let first = self.dirs.pictures.join(slots::picture_file_name(FIRST_SLOT));
        let has_title = !self.options.title.is_empty();
        let collage = if has_title {
            self.workspace.join("title_raw.jpg")
        } else {
            first.clone()
        };

        let exes = &self.toolbox.executables;
        self.toolbox.run(&imagemagick::montage(
            exes,
            &self.options.profile,
            &picks,
            &self.options.background,
            &collage,
        ))?;

        if has_title {
            self.toolbox.run(&imagemagick::draw_title(
                exes,
                &collage,
                &self.options.title,
                &self.options.text_style(),
                &first,
            ))?;
        }

        self.first = Some(first);
        Ok(())
    }

    fn create_last_picture(&mut self) -> StepResult<()> {
        let text = closing_text(&self.options.author, &self.options.epilog, self.today.year());
        let last = self
            .dirs
            .pictures
            .join(slots::picture_file_name(slots::last_slot(self.pictures.len())));

        self.toolbox.run(&imagemagick::label(
            &self.toolbox.executables,
            &self.options.profile,
            &text,
            &self.options.text_style(),
            &last,
        ))?;

        self.last = Some(last);
        Ok(())
    }

    /// First, sources and last picture in playback order.
    fn all_pictures(&self) -> StepResult<Vec<PathBuf>> {
        let (Some(first), Some(last)) = (&self.first, &self.last) else {
            return Err(StepError::precondition_failed(
                "first and last picture have not been created",
            ));
        };
        let mut all = Vec::with_capacity(self.pictures.len() + 2);
        all.push(first.clone());
        all.extend(self.pictures.iter().cloned());
        all.push(last.clone());
        Ok(all)
    }

    fn resize_pictures(&mut self) -> StepResult<()> {
        for pic in self.all_pictures()? {
            self.toolbox.run(&imagemagick::resize(
                &self.toolbox.executables,
                &self.options.profile,
                &self.options.background,
                &pic,
            ))?;
        }
        Ok(())
    }

    fn create_anim_pictures(&mut self) -> StepResult<()> {
        let frames = self
            .options
            .profile
            .morph_frames(self.options.transition_duration);
        let pictures = self.all_pictures()?;
        let plan = SlotPlan::new(self.pictures.len());

        for (pair, slot) in pictures.windows(2).zip(plan.transition_slots()) {
            let dir = self.dirs.animations.join(slots::morph_dir_name(slot));
            fs::create_dir(&dir).map_err(|e| StepError::io_error("creating morph folder", e))?;
            self.toolbox.run(&imagemagick::morph(
                &self.toolbox.executables,
                &pair[0],
                &pair[1],
                frames,
                &dir,
            ))?;
        }
        Ok(())
    }

    /// Render picture clips on a second thread while transition clips render
    /// here. Picture slots are odd and transition slots even, so the two
    /// never write the same file.
    fn create_movies(&mut self) -> StepResult<()> {
        let this: &Self = self;
        thread::scope(|scope| {
            let small = scope.spawn(|| this.create_small_movies());
            let transitions = this.create_transition_movies();
            let small = small
                .join()
                .unwrap_or_else(|_| Err(StepError::other("picture movie thread panicked")));
            transitions.and(small)
        })
    }

    fn create_small_movies(&self) -> StepResult<()> {
        let all = self.all_pictures()?;
        let (first, last) = (&all[0], &all[all.len() - 1]);
        let exes = &self.toolbox.executables;
        let fps = self.options.profile.fps;

        self.create_faded_movie(first, FIRST_SLOT, Fade::In)?;

        for (index, pic) in self.pictures.iter().enumerate() {
            let out = self
                .dirs
                .movies
                .join(slots::movie_file_name(slots::source_slot(index)));
            self.toolbox.run(&ffmpeg::still_clip(
                exes,
                pic,
                self.options.image_duration,
                fps,
                false,
                &out,
            ))?;
            if self.options.remove_tempfiles {
                fs::remove_file(pic).map_err(|e| StepError::io_error("removing picture", e))?;
            }
        }

        self.create_faded_movie(last, slots::last_slot(self.pictures.len()), Fade::Out)
    }

    fn create_faded_movie(&self, picture: &Path, slot: u32, fade: Fade) -> StepResult<()> {
        let exes = &self.toolbox.executables;
        let fps = self.options.profile.fps;
        let duration = self.options.image_duration + ffmpeg::FADE_SECONDS;
        let tmp = self.workspace.join(fade.temp_name());
        let out = self.dirs.movies.join(slots::movie_file_name(slot));

        self.toolbox
            .run(&ffmpeg::still_clip(exes, picture, duration, fps, true, &tmp))?;
        let second_pass = match fade {
            Fade::In => ffmpeg::fade_in(exes, &tmp, fps, &out),
            Fade::Out => ffmpeg::fade_out(exes, &tmp, self.options.image_duration, fps, &out),
        };
        self.toolbox.run(&second_pass)?;
        Ok(())
    }

    fn create_transition_movies(&self) -> StepResult<()> {
        let plan = SlotPlan::new(self.pictures.len());
        for slot in plan.transition_slots() {
            let dir = self.dirs.animations.join(slots::morph_dir_name(slot));
            let out = self.dirs.movies.join(slots::movie_file_name(slot));
            self.toolbox.run(&ffmpeg::transition_clip(
                &self.toolbox.executables,
                &dir,
                self.options.profile.fps,
                &out,
            ))?;
            if self.options.remove_tempfiles {
                fs::remove_dir_all(&dir)
                    .map_err(|e| StepError::io_error("removing morph folder", e))?;
            }
        }
        Ok(())
    }

    fn create_video_only_mkv(&mut self) -> StepResult<()> {
        let mut movies = Vec::new();
        let entries = fs::read_dir(&self.dirs.movies)
            .map_err(|e| StepError::io_error("listing movies", e))?;
        for entry in entries {
            let entry = entry.map_err(|e| StepError::io_error("listing movies", e))?;
            movies.push(entry.path());
        }
        movies.sort();

        let expected = SlotPlan::new(self.pictures.len()).segment_count();
        if movies.len() != expected {
            return Err(StepError::precondition_failed(format!(
                "expected {} movie segments, found {}",
                expected,
                movies.len()
            )));
        }

        let tags = self.workspace.join("tags.xml");
        let metadata = TagMetadata::new(&*self.options.author, &*self.options.epilog, self.today);
        fs::write(&tags, metadata.to_xml())
            .map_err(|e| StepError::io_error("writing tags file", e))?;

        let out = self.workspace.join("video_only.mkv");
        let invocation = OptionFileBuilder::new(&out)
            .title(&self.options.title)
            .global_tags(&tags)
            .segments(movies)
            .write(&self.toolbox.executables, &self.workspace.join("video_only.txt"))?;
        self.toolbox.run(&invocation)?;

        self.output = Some(out);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum Fade {
    In,
    Out,
}

impl Fade {
    fn temp_name(&self) -> &'static str {
        match self {
            Fade::In => "first.mp4",
            Fade::Out => "last.mp4",
        }
    }
}

/// Draw distinct indices below `count` for the title collage, sorted.
///
/// Draws uniformly and retries duplicates until four are found. With fewer
/// than four candidates every index is returned.
pub fn sample_indices<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Vec<usize> {
    if count <= COLLAGE_SIZE {
        return (0..count).collect();
    }
    let mut picks = BTreeSet::new();
    while picks.len() < COLLAGE_SIZE {
        picks.insert(rng.random_range(0..count));
    }
    picks.into_iter().collect()
}

/// Text of the last picture.
///
/// Without author and epilog it is a generic credit; otherwise a copyright
/// line and/or the epilog, one per line.
pub fn closing_text(author: &str, epilog: &str, year: i32) -> String {
    if author.is_empty() && epilog.is_empty() {
        return format!("Built with slideshow {}", year);
    }
    let mut lines = Vec::new();
    if !author.is_empty() {
        lines.push(format!("\u{a9} {} {}", year, author));
    }
    if !epilog.is_empty() {
        lines.push(epilog.to_string());
    }
    lines.join("\n")
}
