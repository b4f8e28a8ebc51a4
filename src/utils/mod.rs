//! Index arithmetic helpers.
//!
//! Quota matrices and decode tables are stored flat in row-major order. These
//! functions convert between coordinate tuples and flat offsets and are used
//! throughout the library whenever an N-dimensional cell has to be addressed.

/// Product of a list of sizes, or `None` on overflow.
///
/// # Examples
///
/// ```
/// use counterbalance::utils::checked_product;
///
/// assert_eq!(checked_product(&[2, 2, 4]), Some(16));
/// assert_eq!(checked_product(&[]), Some(1));
/// assert_eq!(checked_product(&[usize::MAX, 2]), None);
/// ```
#[must_use]
pub fn checked_product(sizes: &[usize]) -> Option<usize> {
    sizes.iter().try_fold(1usize, |acc, &s| acc.checked_mul(s))
}

/// Row-major strides for a shape.
///
/// The last axis is contiguous (stride 1).
///
/// # Examples
///
/// ```
/// use counterbalance::utils::row_major_strides;
///
/// assert_eq!(row_major_strides(&[2, 3, 4]), vec![12, 4, 1]);
/// ```
#[must_use]
pub fn row_major_strides(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![1; shape.len()];
    for axis in (0..shape.len().saturating_sub(1)).rev() {
        strides[axis] = strides[axis + 1] * shape[axis + 1];
    }
    strides
}

/// Flat row-major offset of `coords` within `shape`.
///
/// Returns `None` if the number of coordinates does not match the shape or any
/// coordinate is out of range.
///
/// # Examples
///
/// ```
/// use counterbalance::utils::ravel_index;
///
/// assert_eq!(ravel_index(&[1, 0, 3], &[2, 3, 4]), Some(15));
/// assert_eq!(ravel_index(&[2, 0, 0], &[2, 3, 4]), None);
/// assert_eq!(ravel_index(&[1, 0], &[2, 3, 4]), None);
/// ```
#[must_use]
pub fn ravel_index(coords: &[u32], shape: &[usize]) -> Option<usize> {
    if coords.len() != shape.len() {
        return None;
    }

    let mut offset = 0usize;
    for (&c, &extent) in coords.iter().zip(shape) {
        let c = c as usize;
        if c >= extent {
            return None;
        }
        offset = offset * extent + c;
    }
    Some(offset)
}

/// Coordinates of the flat row-major `index` within `shape`.
///
/// Inverse of [`ravel_index`]. Returns `None` if `index` lies outside the shape.
///
/// # Examples
///
/// ```
/// use counterbalance::utils::unravel_index;
///
/// assert_eq!(unravel_index(15, &[2, 3, 4]), Some(vec![1, 0, 3]));
/// assert_eq!(unravel_index(24, &[2, 3, 4]), None);
/// ```
#[must_use]
pub fn unravel_index(mut index: usize, shape: &[usize]) -> Option<Vec<u32>> {
    if index >= checked_product(shape)? {
        return None;
    }

    let mut coords = vec![0u32; shape.len()];
    for axis in (0..shape.len()).rev() {
        let extent = shape[axis];
        coords[axis] = (index % extent) as u32;
        index /= extent;
    }
    Some(coords)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strides_single_axis() {
        assert_eq!(row_major_strides(&[5]), vec![1]);
        assert!(row_major_strides(&[]).is_empty());
    }

    #[test]
    fn test_ravel_unravel_agree() {
        let shape = [3, 1, 4, 2];
        let total = checked_product(&shape).unwrap();
        for i in 0..total {
            let coords = unravel_index(i, &shape).unwrap();
            assert_eq!(ravel_index(&coords, &shape), Some(i));
        }
    }

    #[test]
    fn test_ravel_matches_strides() {
        let shape = [2, 3, 4];
        let strides = row_major_strides(&shape);
        let coords = [1u32, 2, 3];
        let expected: usize = coords
            .iter()
            .zip(&strides)
            .map(|(&c, &s)| c as usize * s)
            .sum();
        assert_eq!(ravel_index(&coords, &shape), Some(expected));
    }

    #[test]
    fn test_unravel_row_major_order() {
        // Last axis varies fastest
        let shape = [2, 2];
        let all: Vec<Vec<u32>> = (0..4).map(|i| unravel_index(i, &shape).unwrap()).collect();
        assert_eq!(all, vec![vec![0, 0], vec![0, 1], vec![1, 0], vec![1, 1]]);
    }
}
