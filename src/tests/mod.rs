
#[test]
fn ex_readme_examples() -> std::io::Result<()> {
    use std::io::Write as _;

    use super::{to_utf8, ConvReader, ConvWriter, ErrorPolicy};

    let sjis: &[u8] = &[72, 101, 108, 108, 111, 32, 144, 162, 138, 69];

    let mut reader = ConvReader::new(sjis, "Shift_JIS")?;
    let utf8 = reader.read_all()?;
    assert_eq!(utf8, "Hello 世界");
    assert_eq!(to_utf8(sjis, "cp932", ErrorPolicy::Stop)?, "Hello 世界");

    let mut writer = ConvWriter::new(Vec::new(), "sjis")?;
    write!(writer, "{}", utf8)?;
    let (bytes, result) = writer.finish();
    result?;
    assert_eq!(bytes, sjis);

    Ok(())
}
