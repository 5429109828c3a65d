use super::*;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_stub_embedding_is_deterministic_and_normalized() {
    let encoder = QueryEncoder::stub();
    assert!(encoder.is_stub());

    let a = encoder.embed("energias renovaveis Norte").unwrap();
    let b = encoder.embed("energias renovaveis Norte").unwrap();
    let c = encoder.embed("turismo Algarve").unwrap();

    assert_eq!(a.len(), STUB_EMBEDDING_DIM);
    assert_eq!(a, b);
    assert_ne!(a, c);

    let norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() < 1e-4);
}

#[test]
fn test_load_without_model_path_is_stub() {
    let encoder = QueryEncoder::load(EncoderConfig {
        stub_dim: 16,
        ..EncoderConfig::stub()
    })
    .unwrap();

    assert!(encoder.is_stub());
    assert_eq!(encoder.embed("x").unwrap().len(), 16);
    assert!(format!("{:?}", encoder).contains("Stub(dim=16)"));
}

#[test]
fn test_load_missing_directory() {
    let err = QueryEncoder::load(EncoderConfig::new("/nonexistent/encoder")).unwrap_err();
    assert!(matches!(err, EmbeddingError::ModelNotFound { .. }));
}

#[test]
fn test_load_directory_without_weights() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("config.json"), "{}").unwrap();

    let err = QueryEncoder::load(EncoderConfig::new(dir.path())).unwrap_err();
    match err {
        EmbeddingError::ModelNotFound { path } => {
            assert_eq!(path, dir.path().join("model.safetensors"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_config_validate() {
    assert!(EncoderConfig::default().validate().is_ok());

    let empty_path = EncoderConfig {
        model_path: Some(PathBuf::new()),
        ..Default::default()
    };
    assert!(matches!(
        empty_path.validate(),
        Err(EmbeddingError::InvalidConfig { .. })
    ));

    let zero_len = EncoderConfig {
        max_seq_len: 0,
        ..Default::default()
    };
    assert!(zero_len.validate().is_err());
}
