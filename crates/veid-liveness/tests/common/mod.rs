//! Synthetic captures shared by the integration tests

#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use veid_liveness::{Frame, HeadPose, LandmarkData, Point};

pub const FRAME_MS: f64 = 33.0;

/// Smooth shaded oval on a darker background with fine skin-like grain.
/// `phase` shifts the grain so consecutive frames differ slightly.
pub fn face_frame(size: u32, phase: u32, timestamp_us: i64) -> Frame {
    let c = size as f32 / 2.0;
    Frame::from_fn(size, size, timestamp_us, |x, y| {
        let dx = (x as f32 - c) / (0.4 * size as f32);
        let dy = (y as f32 - c) / (0.5 * size as f32);
        let r2 = dx * dx + dy * dy;
        let grain = ((x * 7 + y * 13 + phase * 5) % 11) as f32;
        if r2 < 1.0 {
            let shade = 190.0 - 60.0 * r2 + grain;
            [shade as u8, (shade * 0.8) as u8, (shade * 0.65) as u8]
        } else {
            let v = 40.0 + grain;
            [v as u8, v as u8, (v * 1.2) as u8]
        }
    })
}

/// `n` byte-identical copies of one static face
pub fn static_capture(n: usize) -> Vec<Frame> {
    vec![face_frame(96, 0, 0); n]
}

/// Face frames with per-frame grain shifts
pub fn moving_capture(n: usize) -> Vec<Frame> {
    (0..n)
        .map(|i| face_frame(96, i as u32, i as i64 * 33_000))
        .collect()
}

/// Head offsets of an unsteady hand-held capture, one per frame
const HEAD_DRIFT: [(i32, i32); 20] = [
    (0, 0), (1, 0), (1, 0), (2, 1), (2, 1), (0, 1), (3, 2), (3, 2), (1, 2), (1, 1),
    (2, 0), (2, 0), (0, 0), (1, 2), (1, 2), (3, 1), (2, 1), (2, 1), (0, 2), (1, 0),
];

fn pixel_hash(x: u32, y: u32, seed: u32) -> u32 {
    let mut h = x.wrapping_mul(0x9E37_79B1) ^ y.wrapping_mul(0x85EB_CA77) ^ seed.wrapping_mul(0xC2B2_AE3D);
    h ^= h >> 15;
    h = h.wrapping_mul(0x2C1B_3C6D);
    h ^= h >> 12;
    h = h.wrapping_mul(0x297A_2D39);
    h ^ (h >> 15)
}

/// Uniform integer noise in `-(span / 2)..=span / 2`
fn hash_noise(x: u32, y: u32, seed: u32, span: u32) -> i32 {
    (pixel_hash(x, y, seed) % span) as i32 - (span / 2) as i32
}

fn channel(v: i32) -> u8 {
    v.clamp(0, 255) as u8
}

/// Camera-like face: pores and skin chroma fixed to a head that drifts by a
/// pixel or two between frames, fresh sensor noise every frame, a small
/// forehead highlight, and a static noisy background.
pub fn natural_frame(size: u32, index: usize, timestamp_us: i64) -> Frame {
    let s = size as i32;
    let (c, rx, ry) = (s / 2, s * 2 / 5, s / 2);
    let glint_y = c - s / 5;
    let (ox, oy) = HEAD_DRIFT[index % HEAD_DRIFT.len()];
    let frame_seed = index as u32 + 1;

    Frame::from_fn(size, size, timestamp_us, |x, y| {
        let sensor = hash_noise(x, y, frame_seed, 9);
        let (u, v) = (x as i32 - ox, y as i32 - oy);
        let (dx, dy) = (u - c, v - c);
        let r2 = dx * dx * 1000 / (rx * rx) + dy * dy * 1000 / (ry * ry);

        if r2 < 1000 {
            let (fu, fv) = (u as u32, v as u32);
            let gy = v - glint_y;
            let l = if dx * dx + gy * gy <= 25 {
                225 + sensor
            } else {
                160 - 50 * r2 / 1000 + hash_noise(fu, fv, 0, 41) + sensor
            };
            [
                channel(l + 25 + hash_noise(fu, fv, 11, 33)),
                channel(l - 10 + hash_noise(fu, fv, 12, 33)),
                channel(l - 40 + hash_noise(fu, fv, 13, 33)),
            ]
        } else {
            let n = hash_noise(x, y, 7, 21) + sensor;
            [channel(45 + n), channel(50 + n), channel(70 + n)]
        }
    })
}

/// Hand-held capture of a real face
pub fn natural_capture(n: usize) -> Vec<Frame> {
    (0..n)
        .map(|i| natural_frame(96, i, i as i64 * 33_000))
        .collect()
}

/// Uniform random RGB noise
pub fn noise_frames(seed: u64, n: usize, size: u32) -> Vec<Frame> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|i| Frame::from_fn(size, size, i as i64, |_, _| [rng.gen(), rng.gen(), rng.gen()]))
        .collect()
}

pub fn eye(cx: f32, cy: f32, w: f32, h: f32) -> Vec<Point> {
    vec![
        [cx - w, cy],
        [cx - w / 3.0, cy - h],
        [cx + w / 3.0, cy - h],
        [cx + w, cy],
        [cx + w / 3.0, cy + h],
        [cx - w / 3.0, cy + h],
    ]
}

pub fn mouth(cx: f32, cy: f32, w: f32, h: f32) -> Vec<Point> {
    (0..12)
        .map(|i| {
            let angle = std::f32::consts::PI * i as f32 / 6.0;
            [cx - w * angle.cos(), cy - h * angle.sin()]
        })
        .collect()
}

/// Open-eyed neutral face at `frame_index`
pub fn neutral_landmarks(frame_index: usize, timestamp_ms: f64) -> LandmarkData {
    LandmarkData::new(frame_index, timestamp_ms)
        .with_eyes(eye(-30.0, 50.0, 15.0, 5.0), eye(30.0, 50.0, 15.0, 5.0))
        .with_mouth_outer(mouth(0.0, 120.0, 20.0, 8.0))
        .with_eyebrows(
            (0..5).map(|i| [-50.0 + 10.0 * i as f32, 30.0]).collect(),
            (0..5).map(|i| [10.0 + 10.0 * i as f32, 30.0]).collect(),
        )
}

/// Neutral sequence whose eyes are closed on `closed` frames
pub fn blink_sequence(n: usize, spacing_ms: f64, closed: std::ops::Range<usize>) -> Vec<LandmarkData> {
    (0..n)
        .map(|i| {
            let mut lm = neutral_landmarks(i, i as f64 * spacing_ms);
            if closed.contains(&i) {
                lm.left_eye = Some(eye(-30.0, 50.0, 15.0, 0.5));
                lm.right_eye = Some(eye(30.0, 50.0, 15.0, 0.5));
            }
            lm
        })
        .collect()
}

/// Neutral sequence with yaw stepping to `yaw` from frame `from`
pub fn yaw_sequence(n: usize, from: usize, yaw: f32) -> Vec<LandmarkData> {
    (0..n)
        .map(|i| {
            let pose = HeadPose::new(0.0, if i >= from { yaw } else { 0.0 }, 0.0);
            neutral_landmarks(i, i as f64 * FRAME_MS).with_head_pose(pose)
        })
        .collect()
}
