use crate::error::StackNetError;
use crate::matrix::Matrix;

use approx::assert_relative_eq;

#[test]
fn test_from_vec_checks_length() {
    let result = Matrix::from_vec(2, 2, vec![1.0, 2.0, 3.0]);
    assert_eq!(
        result.err(),
        Some(StackNetError::DimensionMismatch {
            expected: 4,
            actual: 3,
        })
    );
}

#[test]
fn test_get_set_row_major() {
    let mut m = Matrix::zeros(2, 3);
    m.set(1, 2, 5.0);
    assert_eq!(m.get(1, 2), 5.0);
    assert_eq!(m.data()[5], 5.0);
}

#[test]
fn test_matmul() {
    let a = Matrix::from_vec(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
    let b = Matrix::from_vec(3, 2, vec![7.0, 8.0, 9.0, 10.0, 11.0, 12.0]).unwrap();
    let product = a.matmul(&b).unwrap();
    assert_eq!(product.rows(), 2);
    assert_eq!(product.cols(), 2);
    assert_eq!(product.data(), &[58.0, 64.0, 139.0, 154.0]);
}

#[test]
fn test_matmul_dimension_error() {
    let a = Matrix::zeros(2, 3);
    let b = Matrix::zeros(2, 2);
    assert!(a.matmul(&b).is_err());
}

#[test]
fn test_transpose() {
    let m = Matrix::from_vec(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
    let t = m.transpose();
    assert_eq!(t.rows(), 3);
    assert_eq!(t.cols(), 2);
    assert_eq!(t.data(), &[1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
}

#[test]
fn test_add_assign_and_sub() {
    let mut a = Matrix::from_vec(1, 3, vec![1.0, 2.0, 3.0]).unwrap();
    let b = Matrix::from_vec(1, 3, vec![0.5, 0.5, 0.5]).unwrap();
    a.add_assign(&b).unwrap();
    assert_eq!(a.data(), &[1.5, 2.5, 3.5]);

    let diff = a.sub(&b).unwrap();
    assert_eq!(diff.data(), &[1.0, 2.0, 3.0]);
}

#[test]
fn test_shape_mismatch_reports_operation() {
    let mut a = Matrix::zeros(2, 2);
    let b = Matrix::zeros(3, 2);
    match a.add_assign(&b) {
        Err(StackNetError::ShapeMismatch { operation, .. }) => {
            assert_eq!(operation, "Matrix::add_assign");
        }
        other => panic!("expected ShapeMismatch, got {:?}", other),
    }
}

#[test]
fn test_scale_and_mul_elem() {
    let mut a = Matrix::from_vec(1, 3, vec![1.0, -2.0, 3.0]).unwrap();
    a.scale(2.0);
    assert_eq!(a.data(), &[2.0, -4.0, 6.0]);

    let b = Matrix::from_vec(1, 3, vec![0.5, 1.0, -1.0]).unwrap();
    let product = a.mul_elem(&b).unwrap();
    assert_relative_eq!(product.data()[0], 1.0);
    assert_relative_eq!(product.data()[1], -4.0);
    assert_relative_eq!(product.data()[2], -6.0);
}

#[test]
fn test_flatten_row() {
    let m = Matrix::from_vec(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
    let flat = m.flatten_row();
    assert_eq!(flat.rows(), 1);
    assert_eq!(flat.cols(), 4);
    assert_eq!(flat.data(), &[1.0, 2.0, 3.0, 4.0]);
}

#[test]
fn test_map() {
    let m = Matrix::from_vec(1, 3, vec![-1.0, 0.0, 1.0]).unwrap();
    let doubled = m.map(|v| v * 2.0);
    assert_eq!(doubled.data(), &[-2.0, 0.0, 2.0]);
}
