//! Serde document types for the persisted network format.
//!
//! The document mirrors the on-disk layout trained networks are exchanged
//! in: a list of layer records with shape metadata and raw weight buffers,
//! plus the learning parameters. The core only converts between [`Network`]
//! and [`NetworkDocument`]; reading and writing files belongs to callers.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::StackNetError;
use crate::matrix::Matrix;
use crate::model::network::Network;
use crate::nn::layers::{ConvLayer, FullyConnectedLayer, Layer, LayerKind, MaxPoolLayer, ReluLayer};
use crate::ops::pool::PoolKind;
use crate::optim::LearningParams;
use crate::shape::Dim3;

/// Root of the persisted format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkDocument {
    pub network: NetworkSection,
    pub parameters: LearningParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkSection {
    pub layers: Vec<LayerDocument>,
}

/// One layer record.
///
/// `output_size` is only meaningful for fully-connected layers; the other
/// kinds derive their output from the input size and parameters. `weights`
/// holds one flat row-major buffer per kernel (or a single buffer for a
/// fully-connected weight matrix); empty buffers request fresh random
/// initialisation on import.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerDocument {
    pub layer_type: String,
    pub input_size: Dim3,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_size: Option<Dim3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<LayerParamsDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weights: Option<Vec<Vec<f64>>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerParamsDocument {
    pub stride: usize,
    pub kernel_size: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pooling_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub padding_type: Option<String>,
}

impl Network {
    /// Exports the network's shape metadata and raw weight buffers.
    pub fn to_document(&self) -> NetworkDocument {
        let mut layers = Vec::with_capacity(self.layers().len());
        for layer in self.layers() {
            let mut doc = LayerDocument {
                layer_type: layer.kind().tag().to_string(),
                input_size: layer.input_size(),
                output_size: None,
                parameters: None,
                weights: None,
            };
            match layer.kind() {
                LayerKind::Conv => {
                    doc.parameters = Some(LayerParamsDocument {
                        stride: layer.stride(),
                        kernel_size: layer.kernel_size(),
                        pooling_type: None,
                        padding_type: None,
                    });
                    doc.weights = Some(
                        layer
                            .weights()
                            .iter()
                            .map(|kernel| kernel.data().to_vec())
                            .collect(),
                    );
                }
                LayerKind::MaxPool => {
                    doc.parameters = Some(LayerParamsDocument {
                        stride: layer.stride(),
                        kernel_size: layer.kernel_size(),
                        pooling_type: Some(PoolKind::Max.tag().to_string()),
                        padding_type: Some("valid".to_string()),
                    });
                }
                LayerKind::FullyConnected => {
                    doc.output_size = Some(layer.output_size());
                    doc.weights = Some(
                        layer
                            .weights()
                            .iter()
                            .map(|weights| weights.data().to_vec())
                            .collect(),
                    );
                }
                LayerKind::Relu => {}
            }
            layers.push(doc);
        }
        NetworkDocument {
            network: NetworkSection { layers },
            parameters: *self.params(),
        }
    }

    /// Rebuilds a network from a persisted document.
    ///
    /// Layers whose weight buffers are empty are initialised from `rng`;
    /// unknown layer tags are rejected with
    /// [`StackNetError::UnrecognizedLayerType`].
    pub fn from_document(
        document: &NetworkDocument,
        rng: &mut impl Rng,
    ) -> Result<Network, StackNetError> {
        let params = LearningParams::new(
            document.parameters.learning_rate,
            document.parameters.momentum,
            document.parameters.weight_decay,
        )?;
        let mut network = Network::with_params(params);

        for layer_doc in &document.network.layers {
            let input_size = layer_doc.input_size;
            match layer_doc.layer_type.as_str() {
                "conv" => {
                    let params = require_parameters(layer_doc)?;
                    let weights = layer_doc.weights.as_ref().ok_or_else(|| {
                        StackNetError::InvalidDocument {
                            message: "conv layer needs one weights entry per filter".to_string(),
                        }
                    })?;
                    if weights.is_empty() {
                        return Err(StackNetError::InvalidDocument {
                            message: "conv layer has zero filters".to_string(),
                        });
                    }
                    let mut layer = ConvLayer::new(
                        input_size,
                        params.stride,
                        params.kernel_size,
                        weights.len(),
                        rng,
                    );
                    if weights.iter().any(|buffer| !buffer.is_empty()) {
                        let kernel_rows = input_size.z * params.kernel_size;
                        let kernels = weights
                            .iter()
                            .map(|buffer| {
                                Matrix::from_vec(
                                    kernel_rows,
                                    params.kernel_size,
                                    buffer.clone(),
                                )
                            })
                            .collect::<Result<Vec<_>, _>>()?;
                        layer.set_weights(&kernels)?;
                    }
                    network.push(Layer::Conv(layer))?;
                }
                "relu" => {
                    network.push(Layer::Relu(ReluLayer::new(input_size)))?;
                }
                "pool" => {
                    let params = require_parameters(layer_doc)?;
                    let kind = match params.pooling_type.as_deref() {
                        None => PoolKind::Max,
                        Some(tag) => PoolKind::from_tag(tag).ok_or_else(|| {
                            StackNetError::InvalidDocument {
                                message: format!("unknown pooling type {:?}", tag),
                            }
                        })?,
                    };
                    if kind != PoolKind::Max {
                        return Err(StackNetError::UnsupportedPooling { kind });
                    }
                    if let Some(padding) = params.padding_type.as_deref() {
                        if !padding.eq_ignore_ascii_case("valid") {
                            return Err(StackNetError::InvalidDocument {
                                message: format!("unsupported padding type {:?}", padding),
                            });
                        }
                    }
                    network.push(Layer::MaxPool(MaxPoolLayer::new(
                        input_size,
                        params.stride,
                        params.kernel_size,
                    )))?;
                }
                "fc" => {
                    let outputs = layer_doc
                        .output_size
                        .ok_or_else(|| StackNetError::InvalidDocument {
                            message: "fc layer needs an output size".to_string(),
                        })?
                        .x;
                    let mut layer = FullyConnectedLayer::new(input_size, outputs, rng);
                    if let Some(weights) = &layer_doc.weights {
                        if weights.len() != 1 {
                            return Err(StackNetError::InvalidDocument {
                                message: "fc layer carries exactly one weights buffer"
                                    .to_string(),
                            });
                        }
                        if !weights[0].is_empty() {
                            let matrix = Matrix::from_vec(
                                outputs,
                                input_size.total(),
                                weights[0].clone(),
                            )?;
                            layer.set_weights(&[matrix])?;
                        }
                    }
                    network.push(Layer::FullyConnected(layer))?;
                }
                other => {
                    return Err(StackNetError::UnrecognizedLayerType {
                        tag: other.to_string(),
                    });
                }
            }
        }
        Ok(network)
    }
}

fn require_parameters(
    layer_doc: &LayerDocument,
) -> Result<&LayerParamsDocument, StackNetError> {
    let params = layer_doc
        .parameters
        .as_ref()
        .ok_or_else(|| StackNetError::InvalidDocument {
            message: format!("{} layer needs stride/kernel parameters", layer_doc.layer_type),
        })?;
    if params.stride == 0 || params.kernel_size == 0 {
        return Err(StackNetError::InvalidDocument {
            message: format!(
                "{} layer has zero stride or kernel size",
                layer_doc.layer_type
            ),
        });
    }
    Ok(params)
}

#[cfg(test)]
#[path = "schema_test.rs"]
mod tests;
