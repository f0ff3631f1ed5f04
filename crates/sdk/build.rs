use cfg_aliases::cfg_aliases;

fn main() {
    cfg_aliases! {
        client: { feature = "client" },
        js: { feature = "js" },
    }
}
