//! Randomized rectangle packing for canvas composition.
//!
//! Given a sequence of rectangles with fixed sizes and a square canvas, this
//! module assigns every rectangle a position such that each one is fully
//! contained in the canvas and no two of them intersect. Positions are found
//! by rejection sampling with recursive backtracking: the head of the
//! sequence is held out, the tail is placed recursively, and the head is then
//! drawn at random until it fits; if it collides with the tail, the tail is
//! placed again from scratch.
//!
//! There is deliberately no cap on the number of attempts. A set of
//! rectangles that cannot fit the canvas without overlap keeps the sampler
//! spinning forever, and callers are expected to bound the call with an
//! external timeout. Growing the canvas relative to the total element area
//! makes termination overwhelmingly likely, never certain.

use rand::Rng;

use super::geometry::Rect;

/// Draws a random position for a `width` x `height` rectangle inside the
/// canvas, resampling until the rectangle is fully contained.
///
/// # Arguments
///
/// * `width` - Width of the rectangle to position.
/// * `height` - Height of the rectangle to position.
/// * `canvas` - The canvas extent the rectangle must stay inside.
/// * `rng` - Random source for position draws.
///
/// # Returns
///
/// The `(xmin, ymin)` of a canvas-bounded position.
pub fn find_position<R: Rng + ?Sized>(
    width: u32,
    height: u32,
    canvas: &Rect,
    rng: &mut R,
) -> (u32, u32) {
    loop {
        let xmin = rng.random_range(canvas.xmin()..canvas.xmax());
        let ymin = rng.random_range(canvas.ymin()..canvas.ymax());

        let proposed = Rect::new(xmin, ymin, width, height);
        if canvas.bounds(&proposed) {
            return (xmin, ymin);
        }
    }
}

/// Positions every rectangle in `rects` inside the canvas without overlaps.
///
/// Rectangles are placed in input order. On return, every rectangle is
/// bounded by `canvas` and no pair intersects (touching edges count as an
/// intersection, so placed elements always keep at least one pixel of
/// clearance).
///
/// Recursion depth equals the number of rectangles, which stays small for
/// the element counts this pipeline draws.
///
/// # Arguments
///
/// * `rects` - The rectangles to position; sizes are fixed, positions are
///   overwritten.
/// * `canvas` - The canvas extent.
/// * `rng` - Random source for position draws.
pub fn place_rects<R: Rng + ?Sized>(rects: &mut [Rect], canvas: &Rect, rng: &mut R) {
    let Some((head, tail)) = rects.split_first_mut() else {
        return;
    };

    if tail.is_empty() {
        let (xmin, ymin) = find_position(head.width(), head.height(), canvas, rng);
        head.set_position(xmin, ymin);
        return;
    }

    loop {
        place_rects(tail, canvas, rng);

        let (xmin, ymin) = find_position(head.width(), head.height(), canvas, rng);
        head.set_position(xmin, ymin);

        if !head.intersects_any(tail) {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn assert_valid_placement(rects: &[Rect], canvas: &Rect) {
        for rect in rects {
            assert!(canvas.bounds(rect), "{rect} escapes the canvas");
        }
        for i in 0..rects.len() {
            for j in 0..rects.len() {
                if i != j {
                    assert!(
                        !rects[i].intersects(&rects[j]),
                        "{} intersects {}",
                        rects[i],
                        rects[j]
                    );
                }
            }
        }
    }

    #[test]
    fn test_single_rect_is_bounded() {
        let mut rng = SmallRng::seed_from_u64(7);
        let canvas = Rect::from_size(100, 100);
        let mut rects = vec![Rect::from_size(30, 40)];

        place_rects(&mut rects, &canvas, &mut rng);
        assert_valid_placement(&rects, &canvas);
    }

    #[test]
    fn test_many_rects_do_not_overlap() {
        let mut rng = SmallRng::seed_from_u64(42);
        let canvas = Rect::from_size(400, 400);
        let mut rects = vec![
            Rect::from_size(50, 30),
            Rect::from_size(20, 80),
            Rect::from_size(60, 60),
            Rect::from_size(10, 10),
            Rect::from_size(35, 45),
            Rect::from_size(70, 25),
        ];

        place_rects(&mut rects, &canvas, &mut rng);
        assert_valid_placement(&rects, &canvas);
    }

    #[test]
    fn test_canvas_sized_rect_fills_canvas() {
        let mut rng = SmallRng::seed_from_u64(3);
        let canvas = Rect::from_size(12, 12);
        let mut rects = vec![Rect::from_size(12, 12)];

        place_rects(&mut rects, &canvas, &mut rng);
        assert_eq!(rects[0].xmin(), 0);
        assert_eq!(rects[0].ymin(), 0);
        assert!(canvas.bounds(&rects[0]));
    }

    #[test]
    fn test_placement_preserves_sizes_and_order() {
        let mut rng = SmallRng::seed_from_u64(11);
        let canvas = Rect::from_size(200, 200);
        let sizes = [(40, 20), (15, 15), (25, 60)];
        let mut rects: Vec<Rect> = sizes.iter().map(|&(w, h)| Rect::from_size(w, h)).collect();

        place_rects(&mut rects, &canvas, &mut rng);
        for (rect, &(w, h)) in rects.iter().zip(sizes.iter()) {
            assert_eq!(rect.width(), w);
            assert_eq!(rect.height(), h);
        }
    }

    #[test]
    fn test_seeded_placement_is_reproducible() {
        let canvas = Rect::from_size(300, 300);
        let sizes = [(30, 30), (50, 20), (10, 70)];

        let mut first: Vec<Rect> = sizes.iter().map(|&(w, h)| Rect::from_size(w, h)).collect();
        let mut second = first.clone();

        place_rects(&mut first, &canvas, &mut SmallRng::seed_from_u64(99));
        place_rects(&mut second, &canvas, &mut SmallRng::seed_from_u64(99));
        assert_eq!(first, second);
    }
}
