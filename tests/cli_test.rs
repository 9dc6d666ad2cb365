use assert_cmd::prelude::*; // Add methods on commands
use predicates::prelude::*;
use std::process::Command; // Run programs
use tempfile;
type STDRESULT = Result<(),Box<dyn std::error::Error>>;

#[test]
fn convert_with_default_aff() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let dic_path = temp_dir.path().join("custom.dic");
    let out_path = temp_dir.path().join("custom.bdic");
    std::fs::write(&dic_path,"3\nab\nac\nbanana\n")?;
    let mut cmd = Command::cargo_bin("bdicwriter")?;
    cmd.arg("convert")
        .arg("-i").arg(&dic_path)
        .arg("-o").arg(&out_path)
        .assert()
        .success();
    let expected = bdicwriter::bdic::create_bdic(&["ab","ac","banana"],None)?;
    assert_eq!(std::fs::read(out_path)?,expected);
    Ok(())
}

#[test]
fn convert_with_sibling_aff() -> STDRESULT {
    let aff_text = "SET UTF-8\nTRY abcn\nREP 1\nREP n_a na";
    let temp_dir = tempfile::tempdir()?;
    let dic_path = temp_dir.path().join("custom.dic");
    let aff_path = temp_dir.path().join("custom.aff");
    let out_path = temp_dir.path().join("custom.bdic");
    std::fs::write(&dic_path,"2\nbanana\ncabana\n")?;
    std::fs::write(&aff_path,aff_text)?;
    let mut cmd = Command::cargo_bin("bdicwriter")?;
    cmd.arg("convert")
        .arg("-i").arg(&dic_path)
        .arg("-o").arg(&out_path)
        .assert()
        .success();
    let expected = bdicwriter::bdic::create_bdic(&["banana","cabana"],Some(aff_text))?;
    assert_eq!(std::fs::read(out_path)?,expected);
    Ok(())
}

#[test]
fn unsupported_directive_fails() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let dic_path = temp_dir.path().join("custom.dic");
    let aff_path = temp_dir.path().join("rules.aff");
    let out_path = temp_dir.path().join("custom.bdic");
    std::fs::write(&dic_path,"1\nbanana\n")?;
    std::fs::write(&aff_path,"SET UTF-8\nIGNORE a\n")?;
    let mut cmd = Command::cargo_bin("bdicwriter")?;
    cmd.arg("convert")
        .arg("-i").arg(&dic_path)
        .arg("-a").arg(&aff_path)
        .arg("-o").arg(&out_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("UnsupportedAffDirective"));
    assert!(!out_path.exists());
    Ok(())
}
