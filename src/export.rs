//! Writing field snapshots to disk as grayscale images, one file per iteration.

use crate::{errors::PhysarumError, field::FieldSnapshot};
use clap::ValueEnum;
use image::{
    codecs::{
        png::PngEncoder,
        pnm::{PnmEncoder, PnmSubtype, SampleEncoding},
    },
    ExtendedColorType, ImageEncoder,
};
use log::{debug, info};
use serde::Deserialize;
use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum FrameFormat {
    /// Plain (ASCII) portable graymap
    #[default]
    Pgm,
    /// 8-bit grayscale PNG
    Png,
}

impl FrameFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            FrameFormat::Pgm => "pgm",
            FrameFormat::Png => "png",
        }
    }
}

pub struct FrameExporter {
    output_dir: PathBuf,
    format: FrameFormat,
}

impl FrameExporter {
    /// Creates `output_dir` if it doesn't exist yet.
    pub fn new(output_dir: impl Into<PathBuf>, format: FrameFormat) -> Result<Self, PhysarumError> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir)?;

        info!(
            "writing {:?} frames to '{}'",
            format,
            output_dir.display()
        );

        Ok(Self { output_dir, format })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn frame_path(&self, iteration: usize) -> PathBuf {
        self.output_dir
            .join(format!("{:03}.{}", iteration, self.format.extension()))
    }

    /// Write `snapshot` as the frame for `iteration`, returning the path written.
    pub fn export(
        &self,
        snapshot: &FieldSnapshot,
        iteration: usize,
    ) -> Result<PathBuf, PhysarumError> {
        let path = self.frame_path(iteration);
        let (width, height) = (snapshot.cols() as u32, snapshot.rows() as u32);
        let mut writer = BufWriter::new(File::create(&path)?);

        match self.format {
            FrameFormat::Pgm => PnmEncoder::new(&mut writer)
                .with_subtype(PnmSubtype::Graymap(SampleEncoding::Ascii))
                .write_image(snapshot.values(), width, height, ExtendedColorType::L8)?,
            FrameFormat::Png => PngEncoder::new(&mut writer).write_image(
                snapshot.values(),
                width,
                height,
                ExtendedColorType::L8,
            )?,
        }
        writer.flush()?;

        debug!("wrote frame {} to '{}'", iteration, path.display());
        Ok(path)
    }
}
