//! Test de extremo a extremo del pipeline de checkpoints con un intérprete
//! y un cuantizador falsos.

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use modelflow_core::{CommandConnectors, ConversionStatus, ModelConversion, PipelineState,
                     PythonScript};
use modelflow_adapters::{validate_checkpoint, CheckpointConversion, CheckpointConversionData,
                         CheckpointConversionStep, CheckpointPipelineInput};

fn write_executable(path: &Path, contents: &str) {
    std::fs::write(path, contents).expect("write script");
    let mut perms = std::fs::metadata(path).expect("metadata").permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(path, perms).expect("chmod");
}

#[test]
fn declared_steps_match_the_assembled_pipeline() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = CheckpointPipelineInput {
        validated: modelflow_adapters::ValidatedCheckpointData { checkpoint_dir: dir.path().into() },
        convert_script: PythonScript::new(dir.path().join("convert.py")),
        quantize_binary: dir.path().join("quantize"),
        output_path: dir.path().join("model.ggml"),
    };

    let pipeline = CheckpointConversion.make_conversion_pipeline(input);

    assert_eq!(pipeline.step_kinds(), CheckpointConversion::conversion_steps());
    assert_eq!(pipeline.state(), PipelineState::NotStarted);
}

#[tokio::test]
async fn full_conversion_run_with_fake_tooling() {
    let _ = tracing_subscriber::fmt::try_init();

    let dir = tempfile::tempdir().expect("tempdir");

    // Checkpoint completo.
    let checkpoint_dir = dir.path().join("checkpoint");
    std::fs::create_dir(&checkpoint_dir).expect("mkdir checkpoint");
    for name in ["params.json", "tokenizer.model", "consolidated.00.pth"] {
        std::fs::write(checkpoint_dir.join(name), "x").expect("write fixture");
    }

    // `python3` falso: responde 0 a pip y, cuando recibe un script, escribe
    // el GGML intermedio en su último argumento. `which` falso resuelve.
    let bin_dir = dir.path().join("bin");
    std::fs::create_dir(&bin_dir).expect("mkdir bin");
    write_executable(&bin_dir.join("python3"),
                     "#!/bin/sh\n\
                      case \"$*\" in\n\
                        *\"pip\"*) exit 0 ;;\n\
                      esac\n\
                      for last in \"$@\"; do :; done\n\
                      echo converted > \"$last\"\n");
    write_executable(&bin_dir.join("which"), "#!/bin/sh\nexit 0\n");
    let original_path = std::env::var("PATH").expect("PATH");
    std::env::set_var("PATH", format!("{}:{original_path}", bin_dir.display()));

    // Cuantizador falso: copia la entrada a la salida.
    let quantize_binary = dir.path().join("quantize");
    write_executable(&quantize_binary, "#!/bin/sh\ncp \"$1\" \"$2\"\n");

    // Script de conversión de verdad en disco (el intérprete falso lo ignora
    // pero el staging lo exige).
    let convert_script_path = dir.path().join("convert_checkpoint.py");
    std::fs::write(&convert_script_path, "print('convert')\n").expect("write convert script");

    let validated = validate_checkpoint(CheckpointConversionData::new(&checkpoint_dir), None)
        .expect("checkpoint should validate");

    let output_path = dir.path().join("model.ggml");
    let input = CheckpointPipelineInput {
        validated: validated.into_inner(),
        convert_script: PythonScript::new(&convert_script_path)
            .with_python_dependencies(["numpy", "torch", "sentencepiece"]),
        quantize_binary,
        output_path: output_path.clone(),
    };

    let mut pipeline = CheckpointConversion.make_conversion_pipeline(input);
    let progress = pipeline.progress();

    let status = pipeline.run(CommandConnectors::empty()).await;

    let quantized = match status {
        ConversionStatus::Success(path) => path,
        other => panic!("pipeline should succeed, got {other:?}"),
    };
    assert_eq!(quantized, output_path.with_extension("q4.bin"));
    assert_eq!(std::fs::read_to_string(&output_path).expect("intermediate ggml"),
               "converted\n");
    assert_eq!(std::fs::read_to_string(&quantized).expect("quantized output"),
               "converted\n");
    assert_eq!(progress.state(), PipelineState::Completed);
    assert_eq!(progress.current_step(), None, "no current step after completion");

    // Sanity: el enum de progreso cubre los cinco pasos.
    assert_eq!(CheckpointConversion::conversion_steps().len(), 5);
    assert_eq!(CheckpointConversion::conversion_steps()[3],
               CheckpointConversionStep::ConvertModel);
}
