use clap::{arg,crate_version,ArgGroup,Command};
use entropress::{compress_file,expand_file};

const RCH: &str = "unreachable was reached";

fn main() -> Result<(),Box<dyn std::error::Error>>
{
    let long_help =
"Examples:
---------
Encode:        `entropress -a arith --encode my_file my_file.epr`
Decode:        `entropress -a arith --decode my_file.epr my_file`";

    let methods = ["arith","huffman"];

    let main_cmd = Command::new("entropress")
        .about("Compress and expand files with selectable entropy coders")
        .after_long_help(long_help)
        .version(crate_version!())
        .arg(arg!(-a --algorithm <METHOD> "entropy coder").value_parser(methods)
            .required(true))
        .arg(arg!(--encode "encode infile to outfile"))
        .arg(arg!(--decode "decode infile to outfile"))
        .group(ArgGroup::new("direction").args(["encode","decode"]).required(true))
        .arg(arg!(<infile> "input path"))
        .arg(arg!(<outfile> "output path"));

    let matches = main_cmd.get_matches();

    let method = matches.get_one::<String>("algorithm").expect(RCH);
    let path_in = matches.get_one::<String>("infile").expect(RCH);
    let path_out = matches.get_one::<String>("outfile").expect(RCH);

    if matches.get_flag("encode") {
        compress_file(method,path_in,path_out)?;
    } else {
        expand_file(method,path_in,path_out)?;
    }

    Ok(())
}
