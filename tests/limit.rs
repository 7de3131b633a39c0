#[macro_use]
mod common;

#[cfg(test)]
mod limit {
    tests! {
        too_many_parameters in limit is ERR
        "[line 1] Error at 'a255': Can't have more than 255 parameters."
    }

    tests! {
        too_many_arguments in limit is ERR
        "[line 1] Error at '255': Can't have more than 255 arguments."
    }
}
