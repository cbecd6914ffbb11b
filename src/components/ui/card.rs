use leptos::prelude::*;
use leptos_ui::clx;

mod components {
    use super::*;
    clx! {Card, div, "bg-card text-card-foreground flex flex-col gap-3 rounded-lg border py-4 shadow-sm"}
    clx! {CardHeader, div, "flex flex-col items-start gap-1 px-4"}
    clx! {CardTitle, h2, "leading-none text-sm font-semibold"}
    clx! {CardContent, div, "px-4"}
    clx! {CardDescription, p, "text-muted-foreground text-xs"}
    clx! {CardFooter, footer, "flex items-center px-4", "gap-2"}

    clx! {CardList, ul, "flex flex-col gap-2"}
    clx! {CardItem, li, "flex items-center gap-2 [&_img]:shrink-0"}
}

#[allow(unused_imports)]
pub use components::*;
