use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{
    parse_macro_input, spanned::Spanned, FnArg, GenericArgument, Ident, ItemFn, Pat,
    PathArguments, Signature, Type,
};

/// Transform an asynchronous test into a synchronous one, inject dependencies,
/// and ensure that the database is dropped regardless of how the test terminates.
///
/// Injectable dependencies are [`rocket::local::asynchronous::Client`],
/// [`mongodb::Database`], and [`crate::model::mongodb::Coll<T>`], in any order.
///
/// `#[backend_test(seeded)]` inserts the example student `S1` and the example
/// election `E1` before the test runs.
#[proc_macro_attribute]
pub fn backend_test(args: TokenStream, input: TokenStream) -> TokenStream {
    let mut item_fn = parse_macro_input!(input as ItemFn);

    // Extract the injected arguments and reject invalid function signatures.
    let injected = match check_sig(item_fn.sig.clone()) {
        Ok(injected) => injected,
        Err(err) => {
            return err.into_compile_error().into();
        }
    };

    // Rename the future so the test can have its original name.
    let name = item_fn.sig.ident.clone();
    let new_name = format_ident!("{}_fut", name);
    item_fn.sig.ident = new_name.clone();

    // Seed example records if asked.
    let maybe_seed = match parse_macro_input!(args as Option<Ident>) {
        None => quote! {},
        Some(arg) if arg == "seeded" => quote! {
            crate::model::mongodb::Coll::<crate::model::db::Student>::from_db(&db)
                .insert_one(crate::model::db::Student::example(), None)
                .await
                .unwrap();
            crate::model::mongodb::Coll::<crate::model::db::Election>::from_db(&db)
                .insert_one(crate::model::db::Election::example(), None)
                .await
                .unwrap();
        },
        Some(arg) => {
            return syn::Error::new(arg.span(), "Expected `seeded` or nothing")
                .into_compile_error()
                .into();
        }
    };

    let (bindings, call_args) = injected.into_iter().unzip::<_, _, Vec<_>, Vec<_>>();

    // Rewrite the test function.
    quote! {
        #[test]
        fn #name() {
            /// Test setup.
            async fn setup() -> (rocket::local::asynchronous::Client, mongodb::Database) {
                let db_client = crate::db_client().await;
                let db_name = crate::database();
                let rocket_client = rocket::local::asynchronous::Client::tracked(
                    crate::rocket_for_db(db_client.clone(), &db_name),
                )
                .await
                .unwrap();
                let db = db_client.database(&db_name);

                #maybe_seed

                (rocket_client, db)
            }

            /// The test itself.
            #item_fn

            /// Test cleanup.
            async fn cleanup(db: mongodb::Database) {
                db.drop(None).await.unwrap();
            }

            // Create an async runtime. We need a separate one for inside and
            // outside the `catch_unwind`.
            let outer_runtime = rocket::tokio::runtime::Builder::new_multi_thread()
                .thread_name("test-setup-cleanup")
                .worker_threads(1)
                .enable_all()
                .build()
                .unwrap();
            let inner_runtime = rocket::tokio::runtime::Builder::new_multi_thread()
                .thread_name("rocket-worker-test-thread")
                .worker_threads(2)
                .enable_all()
                .build()
                .unwrap();

            // Run the setup.
            let (rocket_client, db) = outer_runtime.block_on(setup());

            // Run the test, catching any panics.
            // Use mutexes to safely transfer `!UnwindSafe` data.
            let client_mutex = std::sync::Mutex::new(rocket_client);
            let db_mutex = std::sync::Mutex::new(db.clone());
            let runtime_mutex = std::sync::Mutex::new(inner_runtime);
            let result = std::panic::catch_unwind(|| {
                #[allow(unused_variables)]
                let rocket_client = client_mutex.into_inner().unwrap();
                let db = db_mutex.into_inner().unwrap();
                let runtime = runtime_mutex.into_inner().unwrap();

                #(#bindings)*

                runtime.block_on(#new_name(#(#call_args),*));
            });

            // Run the cleanup.
            outer_runtime.block_on(cleanup(db));

            // If the test panicked, re-raise the panic.
            if let Err(cause) = result {
                std::panic::panic_any(cause);
            }
        }
    }
    .into()
}

/// Ensure the wrapped test is async, and for each parameter (in order) produce
/// a binding statement and the expression to pass in its place.
fn check_sig(sig: Signature) -> Result<Vec<(TokenStream2, TokenStream2)>, syn::Error> {
    if sig.asyncness.is_none() {
        return Err(syn::Error::new(sig.span(), "Test must be marked `async`"));
    }

    let mut has_client = false;
    let mut has_db = false;
    let mut injected = vec![];

    for input in &sig.inputs {
        if let FnArg::Typed(pat_type) = input {
            if let Pat::Ident(pat_ident) = &*pat_type.pat {
                if let Type::Path(type_path) = &*pat_type.ty {
                    if let Some(type_ident) = type_path.path.get_ident() {
                        if type_ident == "Client" {
                            if has_client {
                                return Err(syn::Error::new(input.span(), "Test cannot accept more than one `rocket::local::asynchronous::Client`"));
                            }
                            has_client = true;
                            injected.push((quote! {}, quote! { rocket_client }));
                            continue;
                        } else if type_ident == "Database" {
                            if has_db {
                                return Err(syn::Error::new(
                                    input.span(),
                                    "Test cannot accept more than one `mongodb::Database`",
                                ));
                            }
                            has_db = true;
                            injected.push((quote! {}, quote! { db.clone() }));
                            continue;
                        }
                    } else if let Some(collection_type) = collection_type(type_path) {
                        let ident = &pat_ident.ident;
                        injected.push((
                            quote! {
                                let #ident = crate::model::mongodb::Coll::<#collection_type>::from_db(&db);
                            },
                            quote! { #ident },
                        ));
                        continue;
                    }
                }
            }
        }

        return Err(syn::Error::new(
            input.span(),
            "Expected one of `client_ident: Client`, `db_ident: Database` or `collection_ident: Coll<T>`",
        ));
    }

    Ok(injected)
}

/// If the type is `Coll<T>` for a plain identifier `T`, return `T`.
fn collection_type(type_path: &syn::TypePath) -> Option<Ident> {
    // Valid as the last path segment for any type is itself
    let possible_collection = type_path.path.segments.last()?;
    if possible_collection.ident != "Coll" {
        return None;
    }
    if let PathArguments::AngleBracketed(generics) = &possible_collection.arguments {
        if let Some(GenericArgument::Type(Type::Path(type_path))) = generics.args.first() {
            return type_path.path.get_ident().cloned();
        }
    }
    None
}
