use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::StackNetError;
use crate::matrix::Matrix;
use crate::nn::activation::Activation;
use crate::nn::layers::{FullyConnectedLayer, Layer, ReluLayer};
use crate::optim::LearningParams;
use crate::model::network::Network;
use crate::shape::Dim3;

fn rng() -> StdRng {
    StdRng::seed_from_u64(99)
}

fn identity_fc(inputs: usize, rng: &mut StdRng) -> FullyConnectedLayer {
    let mut layer = FullyConnectedLayer::new(Dim3::new(inputs, 1, 1), inputs, rng);
    layer.set_activation(Activation::Identity);
    let mut weights = Matrix::zeros(inputs, inputs);
    for i in 0..inputs {
        weights.set(i, i, 1.0);
    }
    layer.set_weights(std::slice::from_ref(&weights)).unwrap();
    layer
}

#[test]
fn test_empty_network_errors() {
    let mut network = Network::new();
    assert_eq!(
        network.feed_forward(&Matrix::zeros(1, 1)).err(),
        Some(StackNetError::EmptyNetwork)
    );
    assert_eq!(network.output().err(), Some(StackNetError::EmptyNetwork));
    assert_eq!(
        network.backpropagate(&Matrix::zeros(1, 1)).err(),
        Some(StackNetError::EmptyNetwork)
    );
}

#[test]
fn test_push_rejects_incompatible_chain() {
    let mut rng = rng();
    let mut network = Network::new();
    network
        .push(Layer::FullyConnected(FullyConnectedLayer::new(
            Dim3::new(2, 1, 1),
            3,
            &mut rng,
        )))
        .unwrap();
    let mismatched = FullyConnectedLayer::new(Dim3::new(4, 1, 1), 1, &mut rng);
    assert_eq!(
        network.push(Layer::FullyConnected(mismatched)).err(),
        Some(StackNetError::DimensionMismatch {
            expected: 3,
            actual: 4,
        })
    );
}

#[test]
fn test_feed_forward_chains_layer_outputs() {
    let mut rng = rng();
    let mut network = Network::new();
    network
        .push(Layer::FullyConnected(identity_fc(3, &mut rng)))
        .unwrap();
    network.push(Layer::Relu(ReluLayer::new(Dim3::new(3, 1, 1)))).unwrap();

    let input = Matrix::from_vec(3, 1, vec![-1.0, 0.5, 2.0]).unwrap();
    network.feed_forward(&input).unwrap();
    assert_eq!(network.output().unwrap().data(), &[0.0, 0.5, 2.0]);
}

#[test]
fn test_backpropagation_reduces_loss_on_one_sample() {
    let mut rng = rng();
    let mut network = Network::with_params(LearningParams::new(0.1, 0.6, 0.005).unwrap());
    network
        .push(Layer::FullyConnected(FullyConnectedLayer::new(
            Dim3::new(2, 1, 1),
            4,
            &mut rng,
        )))
        .unwrap();
    network
        .push(Layer::FullyConnected(FullyConnectedLayer::new(
            Dim3::new(4, 1, 1),
            1,
            &mut rng,
        )))
        .unwrap();

    let input = Matrix::from_vec(2, 1, vec![1.0, 0.0]).unwrap();
    let target = Matrix::from_vec(1, 1, vec![0.8]).unwrap();

    let loss = |network: &mut Network| {
        network.feed_forward(&input).unwrap();
        let out = network.output().unwrap().data()[0];
        (out - 0.8) * (out - 0.8)
    };

    let before = loss(&mut network);
    for _ in 0..300 {
        network.feed_forward(&input).unwrap();
        network.backpropagate(&target).unwrap();
    }
    let after = loss(&mut network);
    assert!(
        after < before,
        "loss should shrink: before {} after {}",
        before,
        after
    );
    assert!(after < 0.01, "loss after training: {}", after);
}

#[test]
fn test_train_rejects_mismatched_pair_counts() {
    let mut network = Network::new();
    let mut rng = rng();
    network
        .push(Layer::FullyConnected(FullyConnectedLayer::new(
            Dim3::new(1, 1, 1),
            1,
            &mut rng,
        )))
        .unwrap();
    let inputs = vec![Matrix::zeros(1, 1)];
    let result = network.train(&inputs, &[], &[], &[], 1, &mut rng);
    assert_eq!(
        result.err(),
        Some(StackNetError::DimensionMismatch {
            expected: 1,
            actual: 0,
        })
    );
}

#[test]
fn test_train_reports_mean_errors() {
    let mut rng = rng();
    let mut network = Network::with_params(LearningParams::new(0.2, 0.6, 0.005).unwrap());
    network
        .push(Layer::FullyConnected(FullyConnectedLayer::new(
            Dim3::new(1, 1, 1),
            2,
            &mut rng,
        )))
        .unwrap();
    network
        .push(Layer::FullyConnected(FullyConnectedLayer::new(
            Dim3::new(2, 1, 1),
            1,
            &mut rng,
        )))
        .unwrap();

    let inputs = vec![
        Matrix::from_vec(1, 1, vec![0.0]).unwrap(),
        Matrix::from_vec(1, 1, vec![1.0]).unwrap(),
    ];
    let targets = vec![
        Matrix::from_vec(1, 1, vec![0.0]).unwrap(),
        Matrix::from_vec(1, 1, vec![0.5]).unwrap(),
    ];

    let (train_error, test_error) = network
        .train(&inputs, &targets, &inputs, &targets, 200, &mut rng)
        .unwrap();
    assert!(train_error.is_finite() && train_error >= 0.0);
    // Train and test sets are the same pairs here.
    assert!((train_error - test_error).abs() < 1e-12);
    assert!(train_error < 0.05, "train error: {}", train_error);
}

#[test]
fn test_params_mutation() {
    let mut network = Network::new();
    network.params_mut().set_learning_rate(0.2).unwrap();
    assert!((network.params().learning_rate - 0.2).abs() < 1e-12);
}
