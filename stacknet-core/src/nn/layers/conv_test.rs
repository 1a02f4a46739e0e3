use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::matrix::{stack_channels, Matrix};
use crate::nn::layers::conv::ConvLayer;
use crate::ops::conv::convolve_2d;
use crate::optim::LearningParams;
use crate::shape::Dim3;

fn rng() -> StdRng {
    StdRng::seed_from_u64(42)
}

fn sample_input() -> Matrix {
    Matrix::from_vec(
        4,
        4,
        vec![
            0.3, -0.1, 0.5, 0.2, //
            0.8, 0.4, -0.6, 0.1, //
            -0.2, 0.9, 0.7, -0.3, //
            0.6, -0.5, 0.2, 0.4,
        ],
    )
    .unwrap()
}

fn half_squared_error(output: &Matrix, target: &Matrix) -> f64 {
    let diff = output.sub(target).unwrap();
    0.5 * diff.data().iter().map(|v| v * v).sum::<f64>()
}

#[test]
fn test_output_size() {
    let layer = ConvLayer::new(Dim3::new(8, 9, 1), 1, 3, 1, &mut rng());
    assert_eq!(layer.output_size(), Dim3::new(6, 7, 1));
}

#[test]
fn test_output_size_with_stride_and_filters() {
    let layer = ConvLayer::new(Dim3::new(9, 9, 1), 2, 3, 4, &mut rng());
    assert_eq!(layer.output_size(), Dim3::new(4, 4, 4));
}

#[test]
fn test_forward_matches_primitive() {
    let mut layer = ConvLayer::new(Dim3::new(4, 4, 1), 1, 3, 1, &mut rng());
    let kernel =
        Matrix::from_vec(3, 3, vec![1.0, 0.0, -1.0, 2.0, 0.5, -2.0, 1.0, -0.5, 0.0]).unwrap();
    layer.set_weights(std::slice::from_ref(&kernel)).unwrap();

    let input = sample_input();
    layer.feed_forward(&input).unwrap();

    let expected = convolve_2d(&input, &kernel, 1, 1).unwrap();
    assert_eq!(layer.output(), &expected);
}

#[test]
fn test_forward_stacks_filters() {
    let mut layer = ConvLayer::new(Dim3::new(4, 4, 1), 1, 3, 2, &mut rng());
    let input = sample_input();
    layer.feed_forward(&input).unwrap();
    // Two filters, each producing a 2x2 feature map.
    assert_eq!(layer.output().rows(), 4);
    assert_eq!(layer.output().cols(), 2);

    let first = convolve_2d(&input, &layer.kernels()[0], 1, 1).unwrap();
    let second = convolve_2d(&input, &layer.kernels()[1], 1, 1).unwrap();
    assert_eq!(layer.output(), &stack_channels(&first, &second).unwrap());
}

#[test]
fn test_forward_rejects_wrong_input_shape() {
    let mut layer = ConvLayer::new(Dim3::new(4, 4, 1), 1, 3, 1, &mut rng());
    assert!(layer.feed_forward(&Matrix::zeros(5, 5)).is_err());
}

#[test]
fn test_kernel_gradient_matches_finite_differences() {
    let mut layer = ConvLayer::new(Dim3::new(4, 4, 1), 1, 3, 1, &mut rng());
    let input = sample_input();
    let target = Matrix::from_vec(2, 2, vec![0.1, -0.2, 0.3, 0.0]).unwrap();

    layer.feed_forward(&input).unwrap();
    let loss_gradient = layer.output().sub(&target).unwrap();
    layer.calculate_gradients(&loss_gradient).unwrap();
    let analytic = layer.local_deltas()[0].clone();
    let kernel = layer.kernels()[0].clone();

    let h = 1e-6;
    for r in 0..kernel.rows() {
        for c in 0..kernel.cols() {
            let mut plus = kernel.clone();
            plus.set(r, c, kernel.get(r, c) + h);
            let mut minus = kernel.clone();
            minus.set(r, c, kernel.get(r, c) - h);

            layer.set_weights(std::slice::from_ref(&plus)).unwrap();
            layer.feed_forward(&input).unwrap();
            let loss_plus = half_squared_error(layer.output(), &target);

            layer.set_weights(std::slice::from_ref(&minus)).unwrap();
            layer.feed_forward(&input).unwrap();
            let loss_minus = half_squared_error(layer.output(), &target);

            let numeric = (loss_plus - loss_minus) / (2.0 * h);
            assert!(
                (numeric - analytic.get(r, c)).abs() < 1e-6,
                "kernel grad ({}, {}): numeric {} vs analytic {}",
                r,
                c,
                numeric,
                analytic.get(r, c)
            );
        }
    }
}

#[test]
fn test_input_gradient_matches_finite_differences() {
    let mut layer = ConvLayer::new(Dim3::new(4, 4, 1), 1, 3, 1, &mut rng());
    let input = sample_input();
    let target = Matrix::zeros(2, 2);

    layer.feed_forward(&input).unwrap();
    let loss_gradient = layer.output().sub(&target).unwrap();
    layer.calculate_gradients(&loss_gradient).unwrap();
    let analytic = layer.input_gradients().clone();

    let h = 1e-6;
    for r in 0..input.rows() {
        for c in 0..input.cols() {
            let mut plus = input.clone();
            plus.set(r, c, input.get(r, c) + h);
            let mut minus = input.clone();
            minus.set(r, c, input.get(r, c) - h);

            layer.feed_forward(&plus).unwrap();
            let loss_plus = half_squared_error(layer.output(), &target);
            layer.feed_forward(&minus).unwrap();
            let loss_minus = half_squared_error(layer.output(), &target);

            let numeric = (loss_plus - loss_minus) / (2.0 * h);
            assert!(
                (numeric - analytic.get(r, c)).abs() < 1e-6,
                "input grad ({}, {}): numeric {} vs analytic {}",
                r,
                c,
                numeric,
                analytic.get(r, c)
            );
        }
    }
}

#[test]
fn test_multi_channel_gradients_match_kernel_layout() {
    let input_size = Dim3::new(4, 4, 2);
    let mut layer = ConvLayer::new(input_size, 1, 3, 2, &mut rng());
    let channel = sample_input();
    let mut other = sample_input();
    other.scale(-0.5);
    let input = stack_channels(&channel, &other).unwrap();

    layer.feed_forward(&input).unwrap();
    let loss_gradient = layer.output().map(|v| v * 0.1);
    layer.calculate_gradients(&loss_gradient).unwrap();

    for (delta, kernel) in layer.local_deltas().iter().zip(layer.kernels().iter()) {
        assert_eq!(delta.rows(), kernel.rows());
        assert_eq!(delta.cols(), kernel.cols());
    }
    assert_eq!(layer.input_gradients().rows(), input.rows());
    assert_eq!(layer.input_gradients().cols(), input.cols());

    // The cached gradients line up with the kernels, so the update is
    // well-formed for multi-channel layers too.
    layer.update_weights(&LearningParams::default()).unwrap();
}

#[test]
fn test_update_applies_momentum_rule() {
    let mut layer = ConvLayer::new(Dim3::new(4, 4, 1), 1, 3, 1, &mut rng());
    let kernel = Matrix::from_vec(3, 3, vec![0.5; 9]).unwrap();
    layer.set_weights(std::slice::from_ref(&kernel)).unwrap();

    let input = sample_input();
    layer.feed_forward(&input).unwrap();
    let loss_gradient = layer.output().clone();
    layer.calculate_gradients(&loss_gradient).unwrap();

    let delta = layer.local_deltas()[0].clone();
    let params = LearningParams::new(0.1, 0.5, 0.005).unwrap();
    layer.update_weights(&params).unwrap();

    for r in 0..3 {
        for c in 0..3 {
            let expected = 0.5 - (1.0 - 0.5) * 0.1 * delta.get(r, c);
            assert!(
                (layer.kernels()[0].get(r, c) - expected).abs() < 1e-12,
                "kernel ({}, {})",
                r,
                c
            );
        }
    }
}

#[test]
fn test_set_weights_rejects_wrong_shapes() {
    let mut layer = ConvLayer::new(Dim3::new(4, 4, 1), 1, 3, 1, &mut rng());
    assert!(layer.set_weights(&[Matrix::zeros(2, 2)]).is_err());
    assert!(layer
        .set_weights(&[Matrix::zeros(3, 3), Matrix::zeros(3, 3)])
        .is_err());
}
