use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::StandardNormal;

use raster_core::models::Pixel;

// see https://www.kaggle.com/andyxie/k-means-clustering-implementation-in-python

type Rgb = (u8, u8, u8);

/// Plain k-means over RGB triples. Initial centers are drawn from a normal distribution around the
/// mean color, so the result depends only on the pixels and the seed.
pub fn cluster(pixels: &[Pixel], total_clusters: usize, min_error: u32, min_iterations: usize, max_iterations: usize, seed: u64) -> Vec<Pixel> {
    if pixels.is_empty() || total_clusters == 0 {
        return Vec::new();
    }

    let mut rng = StdRng::seed_from_u64(seed);

    let mut pixels: Vec<Rgb> = pixels.iter().map(|v| v.rgb()).collect();
    pixels.sort_unstable();

    let mean = mean_pixel(&pixels);
    let std = std_pixel(&pixels, mean);

    let mut centers: Vec<Rgb> = (0..total_clusters)
        .map(|_| random_center(&mut rng, mean, std))
        .collect();

    // sum of all point coordinates inside cluster, plus the number of points
    let mut cluster_sums = vec![(0u64, 0u64, 0u64, 0u64); total_clusters];

    let mut error = u32::MAX;
    let mut iteration = 0;

    while (error > min_error && iteration < max_iterations) || iteration < min_iterations {
        let mut prev: Option<(Rgb, usize)> = None;

        for sum in cluster_sums.iter_mut() {
            *sum = (0, 0, 0, 0);
        }

        for &pixel in &pixels {
            // pixels are sorted, equal colors come in runs
            let closest = match prev {
                Some((prev_pixel, prev_cluster)) if prev_pixel == pixel => prev_cluster,
                _ => closest_center(&centers, pixel),
            };
            prev = Some((pixel, closest));

            let sum = &mut cluster_sums[closest];
            sum.0 += pixel.0 as u64;
            sum.1 += pixel.1 as u64;
            sum.2 += pixel.2 as u64;
            sum.3 += 1;
        }

        let centers_old = centers.clone();

        for (center, entry) in centers.iter_mut().zip(cluster_sums.iter()) {
            *center = if entry.3 == 0 {
                pixels[rng.gen_range(0..pixels.len())]
            } else {
                ((entry.0 / entry.3) as u8, (entry.1 / entry.3) as u8, (entry.2 / entry.3) as u8)
            };
        }

        error = centers_old.iter()
            .zip(centers.iter())
            .map(|(a, b)| distance(*a, *b))
            .sum();

        iteration += 1;
    }

    trace!("k-means finished after {} iterations, error = {}", iteration, error);

    centers.iter()
        .map(|v| Pixel::from_rgb(v.0, v.1, v.2))
        .collect()
}

fn closest_center(centers: &[Rgb], pixel: Rgb) -> usize {
    let mut closest = 0;
    let mut closest_distance = u32::MAX;

    for (index, center) in centers.iter().enumerate() {
        let distance = distance(pixel, *center);
        if distance < closest_distance {
            closest_distance = distance;
            closest = index;
        }
    }

    closest
}

fn distance(a: Rgb, b: Rgb) -> u32 {
    Pixel::from_rgb(a.0, a.1, a.2).distance_squared(&Pixel::from_rgb(b.0, b.1, b.2))
}

fn random_center(rng: &mut StdRng, mean: (f64, f64, f64), std: (f64, f64, f64)) -> Rgb {
    let r: f64 = rng.sample(StandardNormal);
    let g: f64 = rng.sample(StandardNormal);
    let b: f64 = rng.sample(StandardNormal);

    ((r * std.0 + mean.0) as u8, (g * std.1 + mean.1) as u8, (b * std.2 + mean.2) as u8)
}

// like np.mean, but for pixels!
fn mean_pixel(pixels: &[Rgb]) -> (f64, f64, f64) {
    let total = pixels.len() as f64;
    let sum = pixels.iter().fold((0.0, 0.0, 0.0), |acc, v| {
        (acc.0 + v.0 as f64, acc.1 + v.1 as f64, acc.2 + v.2 as f64)
    });

    (sum.0 / total, sum.1 / total, sum.2 / total)
}

// like np.std, but for pixels!
fn std_pixel(pixels: &[Rgb], mean: (f64, f64, f64)) -> (f64, f64, f64) {
    let total = pixels.len() as f64;
    let sum = pixels.iter().fold((0.0, 0.0, 0.0), |acc, v| {
        (
            acc.0 + (v.0 as f64 - mean.0).powi(2),
            acc.1 + (v.1 as f64 - mean.1).powi(2),
            acc.2 + (v.2 as f64 - mean.2).powi(2),
        )
    });

    ((sum.0 / total).sqrt(), (sum.1 / total).sqrt(), (sum.2 / total).sqrt())
}
