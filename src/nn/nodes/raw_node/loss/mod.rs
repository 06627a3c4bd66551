mod softmax_cross_entropy;

pub(crate) use softmax_cross_entropy::SoftmaxCrossEntropy;
