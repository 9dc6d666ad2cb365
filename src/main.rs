use clap::{arg,crate_version,Command};
use std::path::Path;
use bdicwriter::bdic;

const RCH: &str = "unreachable was reached";

fn main() -> Result<(),Box<dyn std::error::Error>>
{
    env_logger::init();
    let long_help =
"Examples:
---------
Convert:            `bdicwriter convert -i en_custom.dic -o en_custom.bdic`
Convert with rules: `bdicwriter convert -i en_custom.dic -a en_custom.aff -o en_custom.bdic`

When no aff path is given, a sibling `.aff` of the word list is used if it
exists, otherwise a default rule set is generated from the words.";

    let mut main_cmd = Command::new("bdicwriter")
        .about("Write compiled spell-check dictionaries (BDIC)")
        .after_long_help(long_help)
        .version(crate_version!());
    main_cmd = main_cmd.subcommand(Command::new("convert")
        .arg(arg!(-i --input <PATH> "word list path (.dic)").required(true))
        .arg(arg!(-a --aff <PATH> "affix rule path (.aff)").required(false))
        .arg(arg!(-o --output <PATH> "output path (.bdic)").required(true))
        .about("convert a word list to a compiled dictionary"));

    let matches = main_cmd.get_matches();

    if let Some(cmd) = matches.subcommand_matches("convert") {
        let path_in = cmd.get_one::<String>("input").expect(RCH);
        let path_out = cmd.get_one::<String>("output").expect(RCH);
        let dic_text = std::fs::read_to_string(path_in)?;
        let words = bdic::words_from_dic(&dic_text);
        let aff_text = match cmd.get_one::<String>("aff") {
            Some(path) => {
                log::info!("using aff rules from {}",path);
                Some(std::fs::read_to_string(path)?)
            },
            None => {
                let sibling = Path::new(path_in).with_extension("aff");
                if sibling.exists() {
                    log::info!("using aff rules from {}",sibling.display());
                    Some(std::fs::read_to_string(sibling)?)
                } else {
                    log::info!("using default aff rules");
                    None
                }
            }
        };
        let dat = bdic::create_bdic(&words,aff_text.as_deref())?;
        std::fs::write(path_out,dat)?;
    }

    Ok(())
}
