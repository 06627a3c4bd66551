use super::{IMAGE_SHAPE, tiny_checkpoint};
use crate::assert_err;
use crate::fcn::{
    Backbone, BackboneArch, FcnError, SavedModelMeta, Session, read_variables,
    write_random_checkpoint,
};
use crate::nn::{DynamicShape, ParamsFile};
use crate::tensor::Tensor;

#[test]
fn test_load_exposes_feature_maps_at_strides_8_16_32() {
    let dir = tempfile::tempdir().unwrap();
    let checkpoint = tiny_checkpoint(dir.path());
    let session = Session::with_seed(Some(1));
    let backbone = Backbone::load_with_image_shape(&session, &checkpoint, IMAGE_SHAPE).unwrap();

    assert_eq!(backbone.image_input.name().unwrap(), "image_input");
    assert_eq!(backbone.keep_prob.name().unwrap(), "keep_prob");
    assert_eq!(
        backbone.layer3_out.value_expected_shape().unwrap(),
        DynamicShape::new(&[None, Some(6), Some(4), Some(8)])
    );
    assert_eq!(
        backbone.layer4_out.value_expected_shape().unwrap(),
        DynamicShape::new(&[None, Some(8), Some(2), Some(4)])
    );
    assert_eq!(
        backbone.layer7_out.value_expected_shape().unwrap(),
        DynamicShape::new(&[None, Some(12), Some(1), Some(2)])
    );
    // 5个卷积块各1层 + fc6 + fc7，每层卷积核与偏置
    assert_eq!(backbone.variables().len(), 14);
    assert!(
        backbone
            .variables()
            .iter()
            .all(|var| !var.is_trainable().unwrap())
    );
    assert!(session.graph().inner().get_trainable_nodes().is_empty());
}

#[test]
fn test_load_without_image_shape_runs_any_resolution() {
    let dir = tempfile::tempdir().unwrap();
    let checkpoint = tiny_checkpoint(dir.path());
    let session = Session::new();
    let backbone = Backbone::load(&session, &checkpoint).unwrap();
    assert_eq!(
        backbone.layer7_out.value_expected_shape().unwrap(),
        DynamicShape::new(&[None, Some(12), None, None])
    );
    backbone
        .image_input
        .feed(&Tensor::zeros(&[1, 3, 64, 96]))
        .unwrap();
    backbone.layer7_out.forward().unwrap();
    assert_eq!(
        backbone.layer7_out.value().unwrap().unwrap().shape(),
        &[1, 12, 2, 3]
    );
}

#[test]
fn test_snapshot_matches_checkpoint_and_save_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let checkpoint = tiny_checkpoint(dir.path());
    let session = Session::new();
    let backbone = Backbone::load(&session, &checkpoint).unwrap();
    let on_disk = read_variables(&checkpoint).unwrap();
    let snapshot = backbone.snapshot().unwrap();
    assert_eq!(snapshot.entries.len(), on_disk.entries.len());
    for (name, value) in &snapshot.entries {
        assert_eq!(on_disk.get(name), Some(value), "变量{name}不一致");
    }

    let copy = dir.path().join("vgg_copy");
    backbone.save(&copy).unwrap();
    assert_eq!(read_variables(&copy).unwrap(), snapshot);
    assert_eq!(
        SavedModelMeta::read(&copy).unwrap(),
        SavedModelMeta::read(&checkpoint).unwrap()
    );
}

#[test]
fn test_missing_saved_model_files() {
    let dir = tempfile::tempdir().unwrap();
    let session = Session::new();
    assert_err!(
        Backbone::load(&session, dir.path().join("nowhere")),
        FcnError::InvalidSavedModel { .. }
    );

    let checkpoint = tiny_checkpoint(dir.path());
    std::fs::remove_dir_all(checkpoint.join("variables")).unwrap();
    assert_err!(
        Backbone::load(&session, &checkpoint),
        FcnError::InvalidSavedModel { reason, .. } if reason.contains("variables")
    );
}

#[test]
fn test_tag_and_version_checks() {
    let dir = tempfile::tempdir().unwrap();
    let checkpoint = tiny_checkpoint(dir.path());
    let session = Session::new();

    let mut meta = SavedModelMeta::read(&checkpoint).unwrap();
    meta.tags = vec!["resnet".to_string()];
    meta.write(&checkpoint).unwrap();
    assert_err!(Backbone::load(&session, &checkpoint), FcnError::MissingTag(_));

    let mut meta = SavedModelMeta::new(BackboneArch::tiny());
    meta.format_version = 0;
    meta.write(&checkpoint).unwrap();
    assert_err!(
        Backbone::load(&session, &checkpoint),
        FcnError::UnsupportedVersion {
            found: 0,
            required: 1
        }
    );
}

#[test]
fn test_variables_must_match_arch() {
    let dir = tempfile::tempdir().unwrap();
    let checkpoint = tiny_checkpoint(dir.path());
    let variables_file = checkpoint.join("variables").join("variables.bin");
    let original = ParamsFile::load(&variables_file).unwrap();

    let mut missing = original.clone();
    missing.entries.retain(|(name, _)| name != "fc7_b");
    missing.save(&variables_file).unwrap();
    assert_err!(
        Backbone::load(&Session::new(), &checkpoint),
        FcnError::MissingVariable(name) if name == "fc7_b"
    );

    let mut reshaped = original;
    for (name, value) in &mut reshaped.entries {
        if *name == "conv1_1_K" {
            *value = Tensor::zeros(&[4, 3, 5, 5]);
        }
    }
    reshaped.save(&variables_file).unwrap();
    assert_err!(
        Backbone::load(&Session::new(), &checkpoint),
        FcnError::VariableShapeMismatch { name, .. } if name == "conv1_1_K"
    );
}

#[test]
fn test_arch_validation() {
    assert!(BackboneArch::vgg16().validate().is_ok());
    let mut arch = BackboneArch::tiny();
    arch.blocks.pop();
    assert_err!(arch.validate(), FcnError::InvalidConfig(_));
    let mut arch = BackboneArch::tiny();
    arch.fc6_kernel = 2;
    assert_err!(arch.validate(), FcnError::InvalidConfig(_));
    let dir = tempfile::tempdir().unwrap();
    assert_err!(
        write_random_checkpoint(dir.path(), &arch, 0),
        FcnError::InvalidConfig(_)
    );

    let vgg = BackboneArch::vgg16();
    assert_eq!(vgg.feature_channels(), (256, 512, 4096));
    let shapes = vgg.variable_shapes();
    assert_eq!(shapes.len(), 2 * (13 + 2));
    assert_eq!(shapes[0], ("conv1_1_K".to_string(), vec![64, 3, 3, 3]));
    assert!(shapes.contains(&("fc6_K".to_string(), vec![4096, 512, 7, 7])));
}
