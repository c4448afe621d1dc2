use assert_cmd::prelude::*; // Add methods on commands
use std::path::PathBuf;
use std::process::Command; // Run programs
use tempfile;
type STDRESULT = Result<(),Box<dyn std::error::Error>>;

/// Write `dat` to a scratch file, encode and decode it through the binary,
/// and require the expansion to match the original byte for byte.
fn invertibility_test(dat: &[u8],method: &str) -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("original");
    let packed_path = temp_dir.path().join("packed");
    let out_path = temp_dir.path().join("expanded");
    std::fs::write(&in_path,dat)?;
    let mut cmd = Command::cargo_bin("entropress")?;
    cmd.arg("-a").arg(method)
        .arg("--encode")
        .arg(&in_path)
        .arg(&packed_path)
        .assert()
        .success();
    let mut cmd = Command::cargo_bin("entropress")?;
    cmd.arg("-a").arg(method)
        .arg("--decode")
        .arg(&packed_path)
        .arg(&out_path)
        .assert()
        .success();
    match (std::fs::read(&in_path),std::fs::read(&out_path)) {
        (Ok(v1),Ok(v2)) => {
            assert_eq!(v1,v2);
        },
        _ => panic!("unable to compare files")
    }
    Ok(())
}

fn sample_text() -> Vec<u8> {
    let mut dat = Vec::new();
    for _i in 0..200 {
        dat.extend_from_slice(b"I am Sam. Sam I am. I do not like this Sam I am.\n");
    }
    dat
}

fn sample_binary() -> Vec<u8> {
    let mut dat = Vec::new();
    let mut state: u32 = 0xdecafbad;
    for _i in 0..20_000 {
        state = state.wrapping_mul(1103515245).wrapping_add(12345);
        dat.push((state>>16) as u8);
    }
    dat
}

#[test]
fn arith_invertibility() -> STDRESULT {
    invertibility_test(&sample_text(),"arith")?;
    invertibility_test(&sample_binary(),"arith")
}

#[test]
fn huffman_invertibility() -> STDRESULT {
    invertibility_test(&sample_text(),"huffman")?;
    invertibility_test(&sample_binary(),"huffman")
}

#[test]
fn tiny_files_round_trip() -> STDRESULT {
    for method in ["arith","huffman"] {
        invertibility_test(&[],method)?;
        invertibility_test(&[0x41],method)?;
        invertibility_test(&[0x41,0x42],method)?;
    }
    Ok(())
}

#[test]
fn text_compresses() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("original");
    std::fs::write(&in_path,sample_text())?;
    for method in ["arith","huffman"] {
        let packed_path = temp_dir.path().join([method,".epr"].concat());
        let mut cmd = Command::cargo_bin("entropress")?;
        cmd.arg("-a").arg(method)
            .arg("--encode")
            .arg(&in_path)
            .arg(&packed_path)
            .assert()
            .success();
        let packed = std::fs::read(&packed_path)?;
        assert!(packed.len() < sample_text().len(),"{} did not shrink the text",method);
    }
    Ok(())
}

#[test]
fn usage_is_rejected() -> STDRESULT {
    // missing direction flag
    let mut cmd = Command::cargo_bin("entropress")?;
    cmd.arg("-a").arg("arith").arg("somewhere").arg("elsewhere")
        .assert()
        .failure();
    // unknown method
    let mut cmd = Command::cargo_bin("entropress")?;
    cmd.arg("-a").arg("lzw").arg("--encode").arg("somewhere").arg("elsewhere")
        .assert()
        .failure();
    Ok(())
}

#[test]
fn missing_input_fails() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let ghost: PathBuf = temp_dir.path().join("no_such_file");
    let out_path = temp_dir.path().join("packed");
    let mut cmd = Command::cargo_bin("entropress")?;
    cmd.arg("-a").arg("arith")
        .arg("--encode")
        .arg(&ghost)
        .arg(&out_path)
        .assert()
        .failure();
    Ok(())
}

#[test]
fn garbage_stream_fails_cleanly() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("garbage");
    let out_path = temp_dir.path().join("expanded");
    std::fs::write(&in_path,b"this was never a compressed stream")?;
    for method in ["arith","huffman"] {
        let mut cmd = Command::cargo_bin("entropress")?;
        cmd.arg("-a").arg(method)
            .arg("--decode")
            .arg(&in_path)
            .arg(&out_path)
            .assert()
            .failure();
    }
    Ok(())
}
