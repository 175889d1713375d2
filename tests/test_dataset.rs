//! Tests for IDX dataset loading from disk

use ann_engine::dataset::{load_images, load_labels, load_split, IMAGE_MAGIC, LABEL_MAGIC};
use ann_engine::math::MatrixBase;
use ann_engine::Error;
use approx::assert_abs_diff_eq;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write_labels(dir: &Path, name: &str, labels: &[u8]) -> PathBuf {
    let mut data = Vec::new();
    data.extend_from_slice(&LABEL_MAGIC.to_be_bytes());
    data.extend_from_slice(&(labels.len() as u32).to_be_bytes());
    data.extend_from_slice(labels);
    let path = dir.join(name);
    fs::write(&path, data).unwrap();
    path
}

fn write_images(dir: &Path, name: &str, count: u32, rows: u32, cols: u32, pixels: &[u8]) -> PathBuf {
    let mut data = Vec::new();
    data.extend_from_slice(&IMAGE_MAGIC.to_be_bytes());
    for value in [count, rows, cols] {
        data.extend_from_slice(&value.to_be_bytes());
    }
    data.extend_from_slice(pixels);
    let path = dir.join(name);
    fs::write(&path, data).unwrap();
    path
}

#[test]
fn test_load_split_from_files() {
    let dir = TempDir::new().unwrap();
    let labels = write_labels(dir.path(), "labels.idx1-ubyte", &[7, 2, 1]);
    let pixels: Vec<u8> = (0..12).map(|i| (i * 20) as u8).collect();
    let images = write_images(dir.path(), "images.idx3-ubyte", 3, 2, 2, &pixels);

    let split = load_split(&labels, &images).unwrap();
    assert_eq!(split.len(), 3);
    assert_eq!(split.features(), 4);
    assert_eq!(split.labels.as_slice(), &[7.0, 2.0, 1.0]);
    assert_abs_diff_eq!(split.samples[(1, 0)], 80.0 / 255.0, epsilon = 1e-6);
    assert!(split.samples.as_slice().iter().all(|&p| (0.0..=1.0).contains(&p)));
}

#[test]
fn test_count_mismatch_between_files() {
    let dir = TempDir::new().unwrap();
    let labels = write_labels(dir.path(), "labels", &[1, 2]);
    let images = write_images(dir.path(), "images", 3, 1, 1, &[0, 1, 2]);
    assert!(matches!(load_split(&labels, &images), Err(Error::Format(_))));
}

#[test]
fn test_truncated_payload() {
    let dir = TempDir::new().unwrap();
    let images = write_images(dir.path(), "images", 2, 2, 2, &[0; 5]);
    assert!(matches!(load_images(&images), Err(Error::Format(_))));
}

#[test]
fn test_wrong_magic() {
    let dir = TempDir::new().unwrap();
    // An image file read as labels.
    let images = write_images(dir.path(), "images", 1, 1, 1, &[0]);
    assert!(matches!(load_labels(&images), Err(Error::Format(_))));
}

#[test]
fn test_missing_file() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope");
    assert!(matches!(load_labels(&missing), Err(Error::Io(_))));
}
